pub mod ollama_client;
pub mod record_stream;
