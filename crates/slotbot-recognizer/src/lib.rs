pub mod null_recognizer;
pub mod quantity_recognizer;
pub mod recognizer_trait;
pub mod registry;

pub use null_recognizer::NullRecognizer;
pub use quantity_recognizer::QuantityRecognizer;
pub use recognizer_trait::Recognizer;
pub use registry::RecognizerRegistry;
