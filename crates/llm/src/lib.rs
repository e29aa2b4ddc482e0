//! Completion service integration for medrag.
//!
//! A provider-agnostic `LlmClient` trait with two implementations:
//! - **Managed**: the hosted completion endpoint, bearer-token authenticated
//! - **Ollama**: a local runtime, handy for development
//!
//! # Example
//! ```no_run
//! use medrag_llm::{create_client, ClientOptions, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", &ClientOptions::default())?;
//! let request = LlmRequest::new("What is the discharge dose?", "llama3.3-70b");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use providers::{ManagedClient, OllamaClient};
pub use types::ProviderType;
