//! Features Module - Vectorization Engine
//!
//! Turns domain records into fixed-dimension feature vectors.
//! Each data domain picks a strategy; the rest of the pipeline only sees
//! `FeatureVector`s.

pub mod record;
pub mod vector;
pub mod scaling;
pub mod pca;
pub mod tfidf;


// Re-export common types
pub use record::Record;
pub use vector::{check_output, FeatureVector, Vectorizer};
pub use scaling::{MaxScaleVectorizer, MinMaxVectorizer, RawVectorizer};
pub use pca::PcaVectorizer;
pub use tfidf::TfIdfVectorizer;
