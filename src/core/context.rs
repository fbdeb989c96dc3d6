//! Task execution context consumed by the collectives.
//!
//! A context supplies the communicator handles bound to the running task and
//! the launch domain describing how many task instances cooperate.

use crate::core::error::{CollectiveError, Result};
use crate::core::network::{Communicator, LocalCollective};

/// Rectangular launch domain with inclusive bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    lo: Vec<i64>,
    hi: Vec<i64>,
    /// Point count, computed once when the bounds are accepted
    volume: usize,
}

/// Number of points between inclusive bounds, `None` if it does not fit in
/// `usize`. An inverted extent in any dimension gives zero.
fn checked_volume(lo: &[i64], hi: &[i64]) -> Option<usize> {
    lo.iter().zip(hi).try_fold(1usize, |acc, (&lo, &hi)| {
        let extent = if hi < lo {
            0
        } else {
            let span = hi.checked_sub(lo)?.checked_add(1)?;
            usize::try_from(span).ok()?
        };
        acc.checked_mul(extent)
    })
}

impl Domain {
    /// Create a domain from inclusive lower and upper points
    pub fn new(lo: Vec<i64>, hi: Vec<i64>) -> Result<Self> {
        if lo.len() != hi.len() {
            return Err(CollectiveError::invalid_parameter(
                "domain",
                format!("{:?}..={:?}", lo, hi),
                "lower and upper points must have the same dimension",
            ));
        }
        let volume = checked_volume(&lo, &hi).ok_or_else(|| {
            CollectiveError::invalid_parameter(
                "domain",
                format!("{:?}..={:?}", lo, hi),
                "volume does not fit in usize",
            )
        })?;
        Ok(Domain { lo, hi, volume })
    }

    /// One-dimensional domain `0..=points-1`. Point counts beyond `i64::MAX`
    /// are clamped to it.
    pub fn linear(points: usize) -> Self {
        let points = i64::try_from(points).unwrap_or(i64::MAX);
        Domain {
            lo: vec![0],
            hi: vec![points - 1],
            volume: points as usize,
        }
    }

    pub fn dim(&self) -> usize {
        self.lo.len()
    }

    /// Total number of points. An inverted extent in any dimension makes the
    /// domain empty.
    pub fn volume(&self) -> usize {
        self.volume
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }
}

/// Provider of communicators and launch domain for the running task
pub trait TaskContext {
    /// Communicators attached to this task, in request order
    fn communicators(&self) -> &[Communicator];

    /// Domain of the launch this task instance belongs to
    fn launch_domain(&self) -> &Domain;
}

/// Plain context value handed to a task instance
#[derive(Debug, Clone)]
pub struct LaunchContext {
    communicators: Vec<Communicator>,
    domain: Domain,
}

impl LaunchContext {
    pub fn new(communicators: Vec<Communicator>, domain: Domain) -> Self {
        LaunchContext {
            communicators,
            domain,
        }
    }

    /// Single task instance with no communicators attached
    pub fn single() -> Self {
        LaunchContext {
            communicators: Vec::new(),
            domain: Domain::linear(1),
        }
    }
}

impl TaskContext for LaunchContext {
    fn communicators(&self) -> &[Communicator] {
        &self.communicators
    }

    fn launch_domain(&self) -> &Domain {
        &self.domain
    }
}

impl LocalCollective {
    /// One context per rank, each carrying that rank's communicator and a
    /// linear launch domain covering the whole group
    pub fn launch_contexts(&self) -> Vec<LaunchContext> {
        let domain = Domain::linear(self.num_ranks());
        self.communicators()
            .into_iter()
            .map(|comm| LaunchContext::new(vec![Communicator::Cpu(comm)], domain.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_domain_volume() {
        assert_eq!(Domain::linear(1).volume(), 1);
        assert_eq!(Domain::linear(8).volume(), 8);
        assert_eq!(Domain::linear(8).dim(), 1);
    }

    #[test]
    fn test_multi_dimensional_volume() {
        let domain = Domain::new(vec![0, 0], vec![3, 1]).unwrap();
        assert_eq!(domain.volume(), 8);

        let offset = Domain::new(vec![2, 5], vec![4, 5]).unwrap();
        assert_eq!(offset.volume(), 3);
    }

    #[test]
    fn test_inverted_domain_is_empty() {
        let domain = Domain::new(vec![0, 3], vec![3, 2]).unwrap();
        assert!(domain.is_empty());
    }

    #[test]
    fn test_oversized_domain_is_rejected() {
        let err = Domain::new(vec![i64::MIN], vec![i64::MAX]).unwrap_err();
        assert!(matches!(err, CollectiveError::InvalidParameter { .. }));
        assert!(err.to_string().contains("volume does not fit"));

        // Each extent fits but the product does not
        assert!(Domain::new(vec![0, 0], vec![i64::MAX - 1, 3]).is_err());
    }

    #[test]
    fn test_widest_fitting_extent() {
        let domain = Domain::new(vec![0], vec![i64::MAX - 1]).unwrap();
        assert_eq!(domain.volume(), i64::MAX as usize);
        assert_eq!(Domain::linear(usize::MAX).volume(), i64::MAX as usize);
    }

    #[test]
    fn test_domain_dimension_mismatch() {
        assert!(Domain::new(vec![0], vec![1, 1]).is_err());
    }

    #[test]
    fn test_single_context() {
        let ctx = LaunchContext::single();
        assert!(ctx.communicators().is_empty());
        assert_eq!(ctx.launch_domain().volume(), 1);
    }

    #[test]
    fn test_local_launch_contexts() {
        let group = LocalCollective::new(3).unwrap();
        let contexts = group.launch_contexts();
        assert_eq!(contexts.len(), 3);
        for (i, ctx) in contexts.iter().enumerate() {
            assert_eq!(ctx.communicators().len(), 1);
            assert_eq!(ctx.launch_domain().volume(), 3);
            let cpu = ctx.communicators()[0].as_cpu().unwrap();
            assert_eq!(cpu.rank(), i);
        }
    }
}
