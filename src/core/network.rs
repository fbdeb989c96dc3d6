//! # Collective Communication Module
//!
//! Typed surface over the collective transport consumed by the reduction,
//! the tagged communicator handle a task context hands out, and an
//! in-process shared-memory transport whose ranks are threads of one
//! process.

use crate::config::CollectiveConfig;
use crate::core::error::{CollectiveError, Result};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Status reported by a collective call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollStatus {
    Success,
    Failure,
}

/// Element type of a collective call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollDataType {
    /// IEEE-754 double precision
    Float64,
}

impl CollDataType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            CollDataType::Float64 => std::mem::size_of::<f64>(),
        }
    }
}

/// A pre-established collective channel.
///
/// Implementations move each rank's contribution to every other rank. They
/// report problems through [`CollStatus`] instead of panicking.
pub trait CollectiveTransport: Send + Sync + fmt::Debug {
    /// Rank of the caller within the channel
    fn rank(&self) -> usize;

    /// Number of ranks bound to the channel
    fn num_ranks(&self) -> usize;

    /// Gather `count` elements of `send` from every rank into `recv`, block
    /// `i` holding rank `i`'s contribution. Blocks until every rank has
    /// called it.
    fn all_gather(
        &self,
        send: &[f64],
        recv: &mut [f64],
        count: usize,
        dtype: CollDataType,
    ) -> CollStatus;
}

/// CPU collective handle. Cloning shares the underlying channel; the owning
/// context controls its lifetime.
#[derive(Debug, Clone)]
pub struct CpuCommunicator {
    transport: Arc<dyn CollectiveTransport>,
}

impl CpuCommunicator {
    pub fn new(transport: Arc<dyn CollectiveTransport>) -> Self {
        CpuCommunicator { transport }
    }

    pub fn rank(&self) -> usize {
        self.transport.rank()
    }

    pub fn num_ranks(&self) -> usize {
        self.transport.num_ranks()
    }

    pub fn all_gather(
        &self,
        send: &[f64],
        recv: &mut [f64],
        count: usize,
        dtype: CollDataType,
    ) -> CollStatus {
        self.transport.all_gather(send, recv, count, dtype)
    }
}

/// Communicator handle as obtained from a task context, tagged by backend.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Communicator {
    /// Host-side collective channel
    Cpu(CpuCommunicator),
}

impl Communicator {
    /// The CPU collective, if this handle is one
    pub fn as_cpu(&self) -> Option<&CpuCommunicator> {
        match self {
            Communicator::Cpu(comm) => Some(comm),
        }
    }
}

impl From<CpuCommunicator> for Communicator {
    fn from(comm: CpuCommunicator) -> Self {
        Communicator::Cpu(comm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundPhase {
    /// Ranks are depositing their blocks
    Filling,
    /// Every block is in; ranks are copying the result out
    Draining,
}

/// Shared state of one in-process rank group
#[derive(Debug)]
struct GatherState {
    phase: RoundPhase,
    /// Incremented each time a round opens for draining
    generation: u64,
    arrived: usize,
    departed: usize,
    /// Element count agreed for the current round
    count: Option<usize>,
    /// Set when ranks disagree on the count; the whole round fails
    mismatched: bool,
    staging: Vec<f64>,
}

impl Default for GatherState {
    fn default() -> Self {
        Self {
            phase: RoundPhase::Filling,
            generation: 0,
            arrived: 0,
            departed: 0,
            count: None,
            mismatched: false,
            staging: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct SharedGroup {
    num_ranks: usize,
    state: Mutex<GatherState>,
    changed: Condvar,
}

impl SharedGroup {
    fn lock(&self) -> MutexGuard<'_, GatherState> {
        // A rank that panicked mid-round leaves the data consistent enough
        // for the others to observe the failure, so recover from poisoning.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, GatherState>) -> MutexGuard<'a, GatherState> {
        self.changed.wait(guard).unwrap_or_else(|e| e.into_inner())
    }
}

/// Group of ranks sharing one address space.
///
/// Each rank gets its own [`LocalRank`] transport and must drive it from its
/// own thread: `all_gather` is a barrier and a single thread calling it for
/// two ranks deadlocks.
#[derive(Debug, Clone)]
pub struct LocalCollective {
    shared: Arc<SharedGroup>,
}

impl LocalCollective {
    /// Create a group of `num_ranks` ranks
    pub fn new(num_ranks: usize) -> Result<Self> {
        if num_ranks == 0 {
            return Err(CollectiveError::invalid_parameter(
                "num_ranks",
                "0",
                "must be at least 1",
            ));
        }

        log::debug!("Local collective created: num_ranks={}", num_ranks);

        Ok(LocalCollective {
            shared: Arc::new(SharedGroup {
                num_ranks,
                state: Mutex::new(GatherState::default()),
                changed: Condvar::new(),
            }),
        })
    }

    /// Create a group sized by the configuration
    pub fn from_config(config: &CollectiveConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.num_ranks)
    }

    pub fn num_ranks(&self) -> usize {
        self.shared.num_ranks
    }

    /// Transport endpoint for one rank
    pub fn rank(&self, rank: usize) -> Result<LocalRank> {
        if rank >= self.shared.num_ranks {
            return Err(CollectiveError::invalid_parameter(
                "rank",
                rank.to_string(),
                format!("must be below num_ranks ({})", self.shared.num_ranks),
            ));
        }
        Ok(LocalRank {
            rank,
            shared: Arc::clone(&self.shared),
        })
    }

    /// One CPU communicator per rank, ordered by rank
    pub fn communicators(&self) -> Vec<CpuCommunicator> {
        (0..self.shared.num_ranks)
            .map(|rank| {
                CpuCommunicator::new(Arc::new(LocalRank {
                    rank,
                    shared: Arc::clone(&self.shared),
                }))
            })
            .collect()
    }
}

/// One rank's endpoint of a [`LocalCollective`]
#[derive(Debug)]
pub struct LocalRank {
    rank: usize,
    shared: Arc<SharedGroup>,
}

impl LocalRank {
    fn deposit(&self, state: &mut GatherState, send: &[f64], count: usize) {
        let n = self.shared.num_ranks;
        match state.count {
            None => {
                state.count = Some(count);
                state.staging.clear();
                state.staging.resize(n * count, 0.0);
            }
            Some(agreed) if agreed != count => {
                log::warn!(
                    "rank {} gathered count {} but the round agreed on {}",
                    self.rank,
                    count,
                    agreed
                );
                state.mismatched = true;
            }
            Some(_) => {}
        }

        if !state.mismatched {
            let start = self.rank * count;
            state.staging[start..start + count].copy_from_slice(&send[..count]);
        }
    }
}

impl CollectiveTransport for LocalRank {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.shared.num_ranks
    }

    fn all_gather(
        &self,
        send: &[f64],
        recv: &mut [f64],
        count: usize,
        dtype: CollDataType,
    ) -> CollStatus {
        let n = self.shared.num_ranks;

        // Local argument errors fail before joining the round
        if dtype != CollDataType::Float64 || send.len() < count || recv.len() != n * count {
            log::warn!(
                "rank {} all_gather rejected: send={}, recv={}, count={}, num_ranks={}",
                self.rank,
                send.len(),
                recv.len(),
                count,
                n
            );
            return CollStatus::Failure;
        }

        let mut state = self.shared.lock();

        // Wait for the previous round to drain
        while state.phase == RoundPhase::Draining {
            state = self.shared.wait(state);
        }

        self.deposit(&mut state, send, count);
        state.arrived += 1;

        if state.arrived == n {
            state.phase = RoundPhase::Draining;
            state.generation = state.generation.wrapping_add(1);
            self.shared.changed.notify_all();
        } else {
            let generation = state.generation;
            while state.generation == generation {
                state = self.shared.wait(state);
            }
        }

        let status = if state.mismatched {
            CollStatus::Failure
        } else {
            recv.copy_from_slice(&state.staging);
            CollStatus::Success
        };

        state.departed += 1;
        if state.departed == n {
            state.phase = RoundPhase::Filling;
            state.arrived = 0;
            state.departed = 0;
            state.count = None;
            state.mismatched = false;
            self.shared.changed.notify_all();
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_data_type_size() {
        assert_eq!(CollDataType::Float64.size_in_bytes(), 8);
    }

    #[test]
    fn test_local_collective_requires_ranks() {
        assert!(LocalCollective::new(0).is_err());
        let group = LocalCollective::new(2).unwrap();
        assert!(group.rank(1).is_ok());
        assert!(group.rank(2).is_err());
    }

    #[test]
    fn test_communicators_are_ordered_by_rank() {
        let group = LocalCollective::new(3).unwrap();
        let comms = group.communicators();
        assert_eq!(comms.len(), 3);
        for (i, comm) in comms.iter().enumerate() {
            assert_eq!(comm.rank(), i);
            assert_eq!(comm.num_ranks(), 3);
            let handle = Communicator::from(comm.clone());
            assert_eq!(handle.as_cpu().map(|c| c.rank()), Some(i));
        }
    }

    #[test]
    fn test_single_rank_all_gather() {
        let group = LocalCollective::new(1).unwrap();
        let rank = group.rank(0).unwrap();
        let mut recv = vec![0.0; 3];
        let status = rank.all_gather(&[1.0, 2.0, 3.0], &mut recv, 3, CollDataType::Float64);
        assert_eq!(status, CollStatus::Success);
        assert_eq!(recv, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_all_gather_orders_blocks_by_rank() {
        let group = LocalCollective::new(4).unwrap();

        let results: Vec<Vec<f64>> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|r| {
                    let rank = group.rank(r).unwrap();
                    s.spawn(move || {
                        let send = [r as f64, 10.0 * r as f64];
                        let mut recv = vec![0.0; 8];
                        let status = rank.all_gather(&send, &mut recv, 2, CollDataType::Float64);
                        assert_eq!(status, CollStatus::Success);
                        recv
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let expected = vec![0.0, 0.0, 1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        for recv in results {
            assert_eq!(recv, expected);
        }
    }

    #[test]
    fn test_rounds_are_reusable() {
        let group = LocalCollective::new(3).unwrap();

        thread::scope(|s| {
            for r in 0..3 {
                let rank = group.rank(r).unwrap();
                s.spawn(move || {
                    for round in 0..50 {
                        let send = [(round * 3 + r) as f64];
                        let mut recv = vec![0.0; 3];
                        let status = rank.all_gather(&send, &mut recv, 1, CollDataType::Float64);
                        assert_eq!(status, CollStatus::Success);
                        let base = (round * 3) as f64;
                        assert_eq!(recv, vec![base, base + 1.0, base + 2.0]);
                    }
                });
            }
        });
    }

    #[test]
    fn test_wrong_recv_size_fails_locally() {
        let group = LocalCollective::new(2).unwrap();
        let rank = group.rank(0).unwrap();
        let mut recv = vec![0.0; 3];
        let status = rank.all_gather(&[1.0, 2.0], &mut recv, 2, CollDataType::Float64);
        assert_eq!(status, CollStatus::Failure);
        assert_eq!(recv, vec![0.0; 3]);
    }

    #[test]
    fn test_count_mismatch_fails_every_rank() {
        let group = LocalCollective::new(2).unwrap();

        let statuses: Vec<CollStatus> = thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|r| {
                    let rank = group.rank(r).unwrap();
                    s.spawn(move || {
                        let count = r + 1;
                        let send = vec![1.0; count];
                        let mut recv = vec![0.0; 2 * count];
                        rank.all_gather(&send, &mut recv, count, CollDataType::Float64)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(statuses, vec![CollStatus::Failure, CollStatus::Failure]);
    }
}
