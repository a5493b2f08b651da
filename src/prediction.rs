use crate::config::OutputActivation;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PredictionError {
    #[error("model returned {got} scores but {expected} categories are known")]
    WidthMismatch { expected: usize, got: usize },
    #[error("model returned a non-finite score at index {0}")]
    NonFinite(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f32,
}

/// Picks the highest score; on ties the first index wins.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .reduce(|best, current| if current.1 > best.1 { current } else { best })
}

pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub fn top_prediction(
    scores: &[f32],
    labels: &[String],
    activation: OutputActivation,
) -> Result<Prediction, PredictionError> {
    if scores.len() != labels.len() {
        return Err(PredictionError::WidthMismatch {
            expected: labels.len(),
            got: scores.len(),
        });
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(PredictionError::NonFinite(index));
    }

    let activated;
    let scores: &[f32] = match activation {
        OutputActivation::None => scores,
        OutputActivation::Softmax => {
            activated = softmax(scores);
            &activated
        }
    };

    let (index, confidence) = argmax(scores).ok_or(PredictionError::WidthMismatch {
        expected: labels.len(),
        got: 0,
    })?;

    Ok(Prediction {
        prediction: labels[index].clone(),
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_top_prediction_picks_max() {
        let labels = labels(&["dew", "rain", "rime"]);
        let result = top_prediction(&[0.1, 0.7, 0.2], &labels, OutputActivation::None).unwrap();

        assert_eq!(result.prediction, "rain");
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_ties_resolve_to_first_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some((1, 0.4)));
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let labels = labels(&["dew", "rain"]);
        let err = top_prediction(&[0.1, 0.2, 0.7], &labels, OutputActivation::None).unwrap_err();

        assert_eq!(
            err,
            PredictionError::WidthMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_non_finite_scores_are_rejected() {
        let labels = labels(&["dew", "rain"]);
        let err = top_prediction(&[0.1, f32::NAN], &labels, OutputActivation::None).unwrap_err();

        assert_eq!(err, PredictionError::NonFinite(1));
    }

    #[test]
    fn test_softmax_activation() {
        let labels = labels(&["dew", "rain", "rime"]);
        let result =
            top_prediction(&[1.0, 3.0, 2.0], &labels, OutputActivation::Softmax).unwrap();

        assert_eq!(result.prediction, "rain");
        assert!(result.confidence > 0.6 && result.confidence < 0.7);

        let probs = softmax(&[1.0, 3.0, 2.0]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }
}
