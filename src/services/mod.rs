pub mod llm_service;
pub mod ocr_service;
pub mod providers;
pub mod result_store;

pub use llm_service::LlmService;
pub use ocr_service::OcrService;
pub use providers::{MultimodalGrader, ResultStore, TextRecognizer};
pub use result_store::JsonlResultStore;
