//! Session-scoped sprite storage with atomic, last-rebuild-wins publication.

use super::{build_sprite, SpriteDocument, SpriteOptions, SpriteWarning};
use crate::error::VirtModResult;
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Identifies one rebuild. A rebuild publishes only if no newer rebuild is
/// still running or has already published.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RebuildTicket(u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PublishOutcome {
    Published,
    /// A newer rebuild is still running or already published; this result was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub outcome: PublishOutcome,
    pub symbols: usize,
    pub warnings: Vec<SpriteWarning>,
}

/// Holds the current sprite. Readers get an `Arc` snapshot and never observe
/// a partially rebuilt document.
pub struct SpriteStore {
    state: RwLock<StoreState>,
}

struct StoreState {
    document: Arc<SpriteDocument>,
    last_ticket: u64,
    published_ticket: u64,
    /// Rebuilds that started and have neither published nor failed.
    in_flight: BTreeSet<u64>,
}

impl SpriteStore {
    pub fn new(initial: SpriteDocument) -> Self {
        Self {
            state: RwLock::new(StoreState {
                document: Arc::new(initial),
                last_ticket: 0,
                published_ticket: 0,
                in_flight: BTreeSet::new(),
            }),
        }
    }

    pub fn current(&self) -> Arc<SpriteDocument> {
        self.state.read().document.clone()
    }

    /// Starts a rebuild, superseding every rebuild started before it.
    pub fn begin_rebuild(&self) -> RebuildTicket {
        let mut state = self.state.write();
        state.last_ticket += 1;
        let ticket = state.last_ticket;
        state.in_flight.insert(ticket);
        RebuildTicket(ticket)
    }

    /// Swaps in `document` unless a newer rebuild is still running or has
    /// already published.
    pub fn publish(&self, ticket: RebuildTicket, document: SpriteDocument) -> PublishOutcome {
        let mut state = self.state.write();
        state.in_flight.remove(&ticket.0);
        let newer_running = state.in_flight.range(ticket.0 + 1..).next().is_some();
        if newer_running || state.published_ticket > ticket.0 {
            debug!("Discarding superseded sprite rebuild #{}", ticket.0);
            return PublishOutcome::Superseded;
        }
        state.document = Arc::new(document);
        state.published_ticket = ticket.0;
        PublishOutcome::Published
    }

    /// Withdraws a rebuild that failed, so it no longer supersedes older ones.
    pub fn retire(&self, ticket: RebuildTicket) {
        self.state.write().in_flight.remove(&ticket.0);
    }

    /// Rescans the icon directories and publishes the result.
    ///
    /// On error the current document stays in place and the rebuild is retired.
    pub fn rebuild(&self, options: &SpriteOptions) -> VirtModResult<RebuildReport> {
        let ticket = self.begin_rebuild();
        let document = match build_sprite(options) {
            Ok(document) => document,
            Err(err) => {
                self.retire(ticket);
                return Err(err);
            }
        };
        let symbols = document.len();
        let warnings = document.warnings().to_vec();
        let outcome = self.publish(ticket, document);
        if outcome == PublishOutcome::Published {
            info!("Sprite rebuilt with {} symbols", symbols);
        }
        Ok(RebuildReport {
            outcome,
            symbols,
            warnings,
        })
    }
}
