//! Labeled training examples and the store the scoring engine reads them from.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// One human-annotated tweet.
///
/// Both flags may be set (mixed sentiment) or both clear (neutral).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub positive: bool,
    pub negative: bool,
}

impl LabeledExample {
    #[must_use]
    pub fn new(text: impl Into<String>, positive: bool, negative: bool) -> Self {
        Self {
            text: text.into(),
            positive,
            negative,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("example store unavailable: {0}")]
    Unavailable(String),
}

/// Durable source of labeled examples.
#[async_trait]
pub trait ExampleStore: Send + Sync {
    /// Return every stored example in a stable order.
    async fn fetch_all(&self) -> Result<Vec<LabeledExample>, StoreError>;

    /// Persist a new annotation.
    async fn append(&self, example: &LabeledExample) -> Result<(), StoreError>;
}

/// Process-local [`ExampleStore`] used by tests and offline tooling.
#[derive(Debug, Default)]
pub struct InMemoryExampleStore {
    rows: Mutex<Vec<LabeledExample>>,
    unavailable: AtomicBool,
    fetches: AtomicUsize,
}

impl InMemoryExampleStore {
    #[must_use]
    pub fn new(rows: Vec<LabeledExample>) -> Self {
        Self {
            rows: Mutex::new(rows),
            unavailable: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Store pre-populated with [`SAMPLE_EXAMPLES`].
    #[must_use]
    pub fn with_sample_data() -> Self {
        Self::new(sample_examples())
    }

    /// Store that rejects every call with [`StoreError::Unavailable`].
    #[must_use]
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of `fetch_all` calls served so far, including failed ones.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ExampleStore for InMemoryExampleStore {
    async fn fetch_all(&self) -> Result<Vec<LabeledExample>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.rows.lock().await.clone())
    }

    async fn append(&self, example: &LabeledExample) -> Result<(), StoreError> {
        self.check_available()?;
        self.rows.lock().await.push(example.clone());
        Ok(())
    }
}

/// Seed annotations shipped with the service: `(text, positive, negative)`.
pub const SAMPLE_EXAMPLES: &[(&str, bool, bool)] = &[
    ("I love this new product! It's amazing!", true, false),
    ("This is terrible, I'm very disappointed.", false, true),
    ("The service was okay, nothing special.", false, false),
    ("Great customer service and fast delivery.", true, false),
    (
        "The product arrived damaged and customer service was unhelpful.",
        false,
        true,
    ),
    (
        "I'm really enjoying using this app, it's so intuitive!",
        true,
        false,
    ),
    (
        "This update has made everything worse, I can't find anything now.",
        false,
        true,
    ),
    ("Just a normal day, nothing exciting happened.", false, false),
    (
        "Absolutely thrilled with my purchase, best decision ever!",
        true,
        false,
    ),
    (
        "Worst experience ever, will never use this service again.",
        false,
        true,
    ),
    (
        "The new features are impressive, but there are still some bugs.",
        true,
        true,
    ),
    (
        "I'm neutral about this product, it works as expected.",
        false,
        false,
    ),
    ("Excellent value for money, highly recommend!", true, false),
    ("Poor quality and overpriced, avoid at all costs.", false, true),
    (
        "It's an average product, does the job but nothing special.",
        false,
        false,
    ),
];

/// [`SAMPLE_EXAMPLES`] as owned rows.
#[must_use]
pub fn sample_examples() -> Vec<LabeledExample> {
    SAMPLE_EXAMPLES
        .iter()
        .map(|&(text, positive, negative)| LabeledExample::new(text, positive, negative))
        .collect()
}
