use crate::service::ShortenerService;
use tracing::{error, info, warn};
use ushort_core::{LinkId, Repository, ShortenerError};

/// Outcome of a [`ShortenerService::repair`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Links that received their derived token.
    pub repaired: usize,
    /// Links whose derived token is held by another link.
    pub failed: Vec<LinkId>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fails with [`ShortenerError::Inconsistent`] if any link could not be repaired.
    pub fn into_result(self) -> Result<Self, ShortenerError> {
        if self.is_clean() {
            return Ok(self);
        }
        Err(ShortenerError::Inconsistent(format!(
            "{} link(s) could not take their derived token: {:?}",
            self.failed.len(),
            self.failed
        )))
    }
}

/// Outcome of a [`ShortenerService::audit`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub scanned: usize,
    /// Links still waiting for a token.
    pub pending: Vec<LinkId>,
    /// Links whose token is not the encoding of their id.
    pub mismatched: Vec<LinkId>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty()
    }

    /// Fails with [`ShortenerError::Inconsistent`] if any token mismatches its id.
    pub fn into_result(self) -> Result<Self, ShortenerError> {
        if self.is_clean() {
            return Ok(self);
        }
        Err(ShortenerError::Inconsistent(format!(
            "{} link(s) hold a token that does not encode their id: {:?}",
            self.mismatched.len(),
            self.mismatched
        )))
    }
}

impl<R: Repository> ShortenerService<R> {
    /// Sets the derived token on every link left without one.
    ///
    /// Links being created concurrently may be completed here as well; both
    /// writers set the same token, which the store accepts. A link whose
    /// token is taken is recorded in [`RepairReport::failed`] and skipped, so
    /// it never blocks the links after it. Only store failures abort the pass.
    pub async fn repair(&self, batch_size: usize) -> Result<RepairReport, ShortenerError> {
        let batch_size = batch_size.max(1);
        let mut report = RepairReport::default();
        let mut after = None;

        loop {
            let pending = self.repository.find_tokenless(after, batch_size).await?;
            let Some(last) = pending.last() else {
                break;
            };
            after = Some(last.id);
            let exhausted = pending.len() < batch_size;

            for link in pending {
                match self.assign_token(link.id).await {
                    Ok(token) => {
                        info!(id = %link.id, %token, "repaired link without token");
                        report.repaired += 1;
                    }
                    Err(ShortenerError::Inconsistent(_)) => report.failed.push(link.id),
                    Err(err) => return Err(err),
                }
            }

            if exhausted {
                break;
            }
        }

        if report.repaired > 0 {
            warn!(repaired = report.repaired, "repair pass completed orphaned links");
        }
        if !report.is_clean() {
            error!(failed = ?report.failed, "repair pass left links without a token");
        }
        Ok(report)
    }

    /// Scans every link and reports tokens that differ from `Token::encode(id)`.
    pub async fn audit(&self, batch_size: usize) -> Result<AuditReport, ShortenerError> {
        let batch_size = batch_size.max(1);
        let mut report = AuditReport::default();
        let mut after = None;

        loop {
            let page = self.repository.links_after(after, batch_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);
            let exhausted = page.len() < batch_size;

            for link in &page {
                report.scanned += 1;
                if link.token.is_none() {
                    report.pending.push(link.id);
                } else if !link.is_consistent() {
                    error!(id = %link.id, token = ?link.token, "token does not encode link id");
                    report.mismatched.push(link.id);
                }
            }

            if exhausted {
                break;
            }
        }

        info!(
            scanned = report.scanned,
            pending = report.pending.len(),
            mismatched = report.mismatched.len(),
            "audit completed"
        );
        Ok(report)
    }
}
