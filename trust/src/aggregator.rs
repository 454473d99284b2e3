//! Latest advertisement per account.

use std::collections::BTreeMap;

use serde::Serialize;

use warden_chain::{ChainClient, ChainError};
use warden_types::{AccountId, Advertisement, CommitmentRecord, SubnetId};

/// Counts from one refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Entries the chain listed.
    pub listed: usize,
    /// Entries decoded and stored.
    pub upserted: usize,
    /// Entries with no commitment; their prior advertisement is kept.
    pub absent: usize,
    /// Entries whose payload did not decode; skipped.
    pub malformed: usize,
    /// Advertisements tracked after the refresh.
    pub tracked: usize,
}

/// Every account's most recent decoded advertisement.
///
/// Entries are overwritten by newer commitments and never removed: an old
/// advertisement stays until the evaluator finds it outside the window.
#[derive(Clone, Debug, Default)]
pub struct AdvertisementBook {
    ads: BTreeMap<AccountId, Advertisement>,
}

impl AdvertisementBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    pub fn get(&self, account: &AccountId) -> Option<&Advertisement> {
        self.ads.get(account)
    }

    /// Advertisements ordered by account.
    pub fn iter(&self) -> impl Iterator<Item = &Advertisement> {
        self.ads.values()
    }

    /// Fold a full commitment listing into the book.
    pub fn apply(
        &mut self,
        entries: impl IntoIterator<Item = (AccountId, Option<CommitmentRecord>)>,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for (account, record) in entries {
            summary.listed += 1;
            let Some(record) = record else {
                summary.absent += 1;
                continue;
            };
            match warden_protocol::decode_peer_id(&record.info) {
                Ok(peer_id) => {
                    summary.upserted += 1;
                    self.ads.insert(
                        account.clone(),
                        Advertisement {
                            account,
                            peer_id,
                            inscribed_at: record.block,
                        },
                    );
                }
                Err(e) => {
                    summary.malformed += 1;
                    tracing::warn!(
                        %account,
                        block = %record.block,
                        error = %e,
                        "malformed commitment, skipping"
                    );
                }
            }
        }

        summary.tracked = self.ads.len();
        summary
    }

    /// Re-read every commitment of `subnet` and fold it in.
    pub async fn refresh(
        &mut self,
        chain: &dyn ChainClient,
        subnet: SubnetId,
    ) -> Result<RefreshSummary, ChainError> {
        let entries = chain.list_commitments(subnet).await?;
        let summary = self.apply(entries);
        tracing::debug!(
            %subnet,
            listed = summary.listed,
            upserted = summary.upserted,
            malformed = summary.malformed,
            tracked = summary.tracked,
            "refreshed advertisements"
        );
        Ok(summary)
    }
}
