// src/scheduler.rs
//! Periodic sweep that opens and closes auctions on their dates and expires
//! offers nobody answered.
use chrono::Utc;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::marketplace::Marketplace;

pub struct Sweeper {
    marketplace: Arc<Marketplace>,
    every: Duration,
}

impl Sweeper {
    pub fn new(marketplace: Arc<Marketplace>, every_secs: u64) -> Self {
        Sweeper {
            marketplace,
            every: Duration::from_secs(every_secs.max(1)),
        }
    }

    pub fn start(self) -> JoinHandle<()> {
        info!("{:<12} --> sweeping every {:?}", "Scheduler", self.every);
        tokio::spawn(async move {
            let mut ticker = interval(self.every);
            loop {
                ticker.tick().await;
                self.run_once();
            }
        })
    }

    pub fn run_once(&self) {
        match self.marketplace.sweep(Utc::now()) {
            Ok((0, 0)) => {}
            Ok((auctions, offers)) => {
                debug!("{:<12} --> {} auctions advanced, {} offers expired", "Scheduler", auctions, offers)
            }
            Err(e) => error!("{:<12} --> sweep failed: {}", "Scheduler", e),
        }
    }
}
