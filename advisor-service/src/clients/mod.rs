pub mod llm;
pub mod pinecone;

pub use llm::OpenRouterNarrator;
pub use pinecone::PineconeRetriever;
