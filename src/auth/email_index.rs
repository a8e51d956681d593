use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Answers "is this email already registered?" without a database round trip
/// in the common cases.
///
/// The cuckoo filter gives fast negatives (never seen); the moka cache gives
/// fast positives (recently seen). Anything in between falls through to the
/// database.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, ()>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    /// `false` means definitely not registered; `true` may be a false positive.
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.filter
            .read()
            .map(|f| f.contains(&email))
            // a poisoned filter can't rule anything out
            .unwrap_or(true)
    }

    pub fn is_known_taken(&self, email: &str) -> bool {
        self.taken.contains_key(&normalize(email))
    }

    /// Record a registration in both layers.
    pub async fn mark_taken(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.add(&email);
        }
        self.taken.insert(email, ()).await;
    }

    pub(crate) fn add_batch(&self, emails: &[String]) {
        if let Ok(mut filter) = self.filter.write() {
            for email in emails {
                filter.add(email);
            }
        }
    }

    /// Load every registered email into the filter, streaming in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(normalize(&email));
            total += 1;

            if batch.len() == batch_size {
                self.add_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.add_batch(&batch);
        }

        log::info!("Email filter warmup complete: {} users", total);
        Ok(())
    }
}
