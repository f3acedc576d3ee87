use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits row indices into train and test sets while keeping the class ratio of
/// `labels` in both.
///
/// Each class is shuffled with a generator seeded from `seed` and contributes
/// `round(test_size * class_count)` rows to the test set, always leaving at least one
/// row of the class for training. The same labels, `test_size` and `seed` always
/// produce the same split. Both index lists are returned sorted.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut classes: Vec<u8> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for class in classes {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_test = ((members.len() as f64) * test_size).round() as usize;
        let n_test = n_test.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive_fraction(labels: &[u8], indices: &[usize]) -> f64 {
        indices.iter().filter(|&&i| labels[i] == 1).count() as f64 / indices.len() as f64
    }

    #[test]
    fn test_preserves_class_ratio() {
        let labels: Vec<u8> = (0..200).map(|i| if i % 10 < 3 { 1 } else { 0 }).collect();
        let split = stratified_split(&labels, 0.2, 42);

        assert_eq!(split.train.len() + split.test.len(), labels.len());
        assert_eq!(split.test.len(), 40);
        let full = positive_fraction(&labels, &(0..labels.len()).collect::<Vec<_>>());
        assert!((positive_fraction(&labels, &split.train) - full).abs() <= 0.05);
        assert!((positive_fraction(&labels, &split.test) - full).abs() <= 0.05);
    }

    #[test]
    fn test_partitions_are_disjoint() {
        let labels: Vec<u8> = (0..50).map(|i| (i % 2) as u8).collect();
        let split = stratified_split(&labels, 0.2, 7);
        assert!(split.train.iter().all(|i| !split.test.contains(i)));
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels: Vec<u8> = (0..100).map(|i| (i % 3 == 0) as u8).collect();
        assert_eq!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 42));
        assert_ne!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 43));
    }

    #[test]
    fn test_singleton_class_stays_in_train() {
        let split = stratified_split(&[0, 0, 0, 0, 0, 1], 0.2, 42);
        assert!(split.train.contains(&5));
        assert_eq!(split.test.len(), 1);
    }
}
