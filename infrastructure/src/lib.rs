pub mod chunker;
pub mod config;
pub mod content_blocks;
pub mod document_parser;
pub mod embedder;
pub mod embedding_storage;
pub mod openai_client;
pub mod pdf_canvas;
pub mod rag_engine;
pub mod search;
