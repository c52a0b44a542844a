pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod logger;
pub mod models;
pub mod parser;

pub use client::{ApiStatus, BatchClient, FluxKontextClient, ImageClient, RequestExecutor};
pub use config::FluxConfig;
pub use download::{HttpDownloader, ImageDownloader};
pub use error::{FluxError, Result};
pub use models::{
    AspectRatio, BatchFailure, BatchImage, BatchSummary, ChatMessage, GeneratedImage,
    GenerationRequest, OutputFormat,
};
