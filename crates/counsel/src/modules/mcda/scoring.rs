use super::{Criterion, EffectiveCriterion, McdaOption, Polarity};

pub(super) struct Prepared {
    pub criteria: Vec<EffectiveCriterion>,
    pub options: Vec<McdaOption>,
    pub diagnostics: Vec<String>,
}

/// Impute missing attribute values with the median of the values the other
/// options supply; drop criteria no option has a value for. Weights of kept
/// criteria are renormalized so they keep summing to 1.
pub(super) fn prepare(
    criteria: &[Criterion],
    weights: &[f64],
    options: &[McdaOption],
) -> Prepared {
    let mut options = options.to_vec();
    let mut kept = Vec::new();
    let mut diagnostics = Vec::new();

    for (criterion, weight) in criteria.iter().zip(weights) {
        let mut values: Vec<f64> = options
            .iter()
            .filter_map(|option| option.values.get(&criterion.name).copied())
            .collect();

        if values.is_empty() {
            diagnostics.push(format!(
                "No option supplies a value for '{}'; criterion dropped.",
                criterion.name
            ));
            continue;
        }

        values.sort_by(|a, b| a.partial_cmp(b).expect("attribute values are finite"));
        let median = values[values.len() / 2];

        for option in &mut options {
            if !option.values.contains_key(&criterion.name) {
                diagnostics.push(format!(
                    "Imputed median {median} for {}.{}.",
                    option.name, criterion.name
                ));
                option.values.insert(criterion.name.clone(), median);
            }
        }

        kept.push(EffectiveCriterion {
            name: criterion.name.clone(),
            polarity: criterion.polarity,
            weight: *weight,
        });
    }

    let total: f64 = kept.iter().map(|criterion| criterion.weight).sum();
    if total > 0.0 {
        for criterion in &mut kept {
            criterion.weight /= total;
        }
    } else if !kept.is_empty() {
        let share = 1.0 / kept.len() as f64;
        for criterion in &mut kept {
            criterion.weight = share;
        }
    }

    Prepared {
        criteria: kept,
        options,
        diagnostics,
    }
}

/// Min-max scale each criterion's values into [0,1]; cost polarity inverts
/// the scale. A criterion whose options all share one raw value scores a
/// neutral 1.0 everywhere.
pub(super) fn normalize(
    criteria: &[EffectiveCriterion],
    options: &[McdaOption],
) -> Vec<Vec<f64>> {
    criteria
        .iter()
        .map(|criterion| {
            let values: Vec<f64> = options
                .iter()
                .map(|option| option.values[&criterion.name])
                .collect();
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            values
                .iter()
                .map(|value| {
                    if hi == lo {
                        return 1.0;
                    }
                    let scaled = (value - lo) / (hi - lo);
                    match criterion.polarity {
                        Polarity::Benefit => scaled,
                        Polarity::Cost => 1.0 - scaled,
                    }
                })
                .collect()
        })
        .collect()
}

/// Weighted utilities ranked descending; ties keep first-seen option order.
pub(super) fn rank_utilities(
    criteria: &[EffectiveCriterion],
    normalized: &[Vec<f64>],
    options: &[McdaOption],
) -> Vec<(String, f64)> {
    let utilities = utilities_for(
        &criteria.iter().map(|c| c.weight).collect::<Vec<_>>(),
        normalized,
        options.len(),
    );

    let mut ranked: Vec<(String, f64)> = options
        .iter()
        .zip(&utilities)
        .map(|(option, utility)| (option.name.clone(), *utility))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("utilities are finite"));
    ranked
}

/// One-weight-at-a-time perturbation: +0.10 on each criterion's weight in
/// turn, renormalized, checking whether the winner flips.
pub(super) fn sensitivity(
    criteria: &[EffectiveCriterion],
    normalized: &[Vec<f64>],
    options: &[McdaOption],
    winner: &str,
) -> Vec<String> {
    let base: Vec<f64> = criteria.iter().map(|c| c.weight).collect();
    let mut notes = Vec::new();

    for (index, criterion) in criteria.iter().enumerate() {
        let mut tweaked = base.clone();
        tweaked[index] += 0.10;
        let total: f64 = tweaked.iter().sum();
        for weight in &mut tweaked {
            *weight /= total;
        }

        let utilities = utilities_for(&tweaked, normalized, options.len());
        let best = argmax_first(&utilities);
        let new_winner = &options[best].name;
        if new_winner != winner {
            notes.push(format!(
                "If weight({}) +0.10, the winner flips: {winner} -> {new_winner}.",
                criterion.name
            ));
        }
    }

    if notes.is_empty() {
        notes.push("Decision stable under single-weight increases (+0.10).".to_string());
    }
    notes
}

fn utilities_for(weights: &[f64], normalized: &[Vec<f64>], option_count: usize) -> Vec<f64> {
    (0..option_count)
        .map(|option| {
            weights
                .iter()
                .zip(normalized)
                .map(|(weight, scores)| weight * scores[option])
                .sum()
        })
        .collect()
}

fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = index;
        }
    }
    best
}
