//! Waste image classification.
//!
//! [`VisionClient`] talks to the external vision oracle, or returns a fixed,
//! clearly labelled verdict when no credential is configured. Everything the
//! oracle returns passes through [`ClassificationVerdict::sanitize`].

pub mod client;
pub mod error;
pub mod media;
pub mod verdict;

pub use client::{Classifier, ClassifierMode, VisionClient, VisionConfig};
pub use error::VisionError;
pub use media::normalize_media_type;
pub use verdict::{ClassificationVerdict, MOCK_DESCRIPTION};
