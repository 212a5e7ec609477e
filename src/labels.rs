//! Window labeling
//!
//! Each window is labeled with its most frequent activity. Ties go to the
//! activity that appears first within the window, so the result depends only on
//! the window contents.

use crate::types::Activity;

/// Reduces a window's per-sample activities to one label
pub struct LabelAggregator;

impl LabelAggregator {
    /// Most frequent activity in `activities`, or `None` for an empty window
    pub fn aggregate(activities: &[Activity]) -> Option<Activity> {
        // (activity, count) in first-seen order
        let mut counts: Vec<(Activity, usize)> = Vec::with_capacity(Activity::ALL.len());

        for &activity in activities {
            match counts.iter_mut().find(|(a, _)| *a == activity) {
                Some((_, count)) => *count += 1,
                None => counts.push((activity, 1)),
            }
        }

        // max_by_key keeps the last maximum, so fold to keep the first
        counts
            .into_iter()
            .fold(None, |best: Option<(Activity, usize)>, (activity, count)| {
                match best {
                    Some((_, best_count)) if best_count >= count => best,
                    _ => Some((activity, count)),
                }
            })
            .map(|(activity, _)| activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Activity::*;

    #[test]
    fn test_single_activity() {
        assert_eq!(LabelAggregator::aggregate(&[Sitting; 100]), Some(Sitting));
    }

    #[test]
    fn test_majority_wins() {
        let window = [Walking, Running, Running, Stairs, Running, Walking];
        assert_eq!(LabelAggregator::aggregate(&window), Some(Running));
    }

    #[test]
    fn test_tie_goes_to_first_occurring() {
        let window = [Walking, Running, Walking, Running];
        assert_eq!(LabelAggregator::aggregate(&window), Some(Walking));

        let window = [Stairs, Running, Running, Stairs];
        assert_eq!(LabelAggregator::aggregate(&window), Some(Stairs));
    }

    #[test]
    fn test_boundary_window() {
        // 60 sitting then 40 walking
        let mut window = vec![Sitting; 60];
        window.extend(vec![Walking; 40]);
        assert_eq!(LabelAggregator::aggregate(&window), Some(Sitting));
    }

    #[test]
    fn test_empty_window() {
        assert_eq!(LabelAggregator::aggregate(&[]), None);
    }
}
