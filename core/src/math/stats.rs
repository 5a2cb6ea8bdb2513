pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Index of the first maximum; NaN entries never win.
    pub fn argmax_first(samples: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &value) in samples.iter().enumerate() {
            match best {
                Some((_, current)) if value <= current || value.is_nan() => {}
                _ if value.is_nan() => {}
                _ => best = Some((idx, value)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(StatsHelper::mean(&[]), None);
        assert_eq!(StatsHelper::mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn argmax_prefers_first_of_ties() {
        assert_eq!(StatsHelper::argmax_first(&[1.0, 5.0, 5.0, 2.0]), Some(1));
        assert_eq!(StatsHelper::argmax_first(&[f64::NAN, 1.0]), Some(1));
        assert_eq!(StatsHelper::argmax_first(&[]), None);
    }
}
