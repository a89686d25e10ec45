use crate::classifier::Classifier;
use crate::cv::FitnessEvaluator;
use crate::data::Dataset;
use crate::error::CoreError;
use crate::individual::Individual;
use crate::param::{Param, GA};
use crate::population::Population;
use log::{debug, info};
use rand::seq::index::sample;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

//-----------------------------------------------------------------------------
// Genetic Algorithm core functions
//-----------------------------------------------------------------------------

/// Per-generation snapshot of the run, one entry per completed generation.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct EvolutionRecord {
    pub generation: usize,
    /// Fitness of the global best individual after this generation
    pub best_fit: f64,
    /// Best accuracy observed so far in the run, monotone non-decreasing
    pub best_accuracy: f64,
    pub avg_accuracy: f64,
    pub avg_fit: f64,
    /// Selected-feature count of the global best individual
    pub best_k: usize,
    pub diversity: f64,
    /// Mutation rate actually applied during this generation
    pub mutation_rate: f64,
}

/// What a finished (or cancelled) run hands back to the caller.
pub struct GaOutcome {
    pub best: Individual,
    pub history: Vec<EvolutionRecord>,
    pub evaluation_failures: usize,
}

/// Combined fitness: accuracy discounted by a parsimony term. The penalty
/// grows superlinearly with the selected-feature fraction and is bounded by
/// `sparsity_weight`, so it breaks ties between equally accurate masks but
/// cannot invert an accuracy gap larger than that weight.
pub fn fitness(accuracy: f64, feature_ratio: f64, sparsity_weight: f64) -> f64 {
    accuracy - sparsity_weight * feature_ratio.powf(1.5)
}

/// Adapt the mutation rate to population diversity: boost it when the
/// population collapses below the low threshold, damp it when diversity is
/// already high, then clamp to the configured band.
pub fn adapt_mutation_rate(diversity: f64, ga: &GA) -> f64 {
    let rate = if diversity < ga.low_diversity {
        ga.base_mutation_rate * ga.diversity_boost
    } else if diversity > ga.high_diversity {
        ga.base_mutation_rate * ga.diversity_damp
    } else {
        ga.base_mutation_rate
    };
    rate.clamp(ga.min_mutation_rate, ga.max_mutation_rate)
}

/// Tournament selection: draw `tournament_size` distinct individuals and
/// keep the fittest. Ties go to the earliest drawn index, which keeps the
/// pick deterministic for a given RNG state.
pub fn tournament<'a>(
    pop: &'a Population,
    tournament_size: usize,
    rng: &mut ChaCha8Rng,
) -> &'a Individual {
    let draw = sample(
        rng,
        pop.individuals.len(),
        min(tournament_size, pop.individuals.len()),
    );
    let mut winner = &pop.individuals[draw.index(0)];
    for idx in draw.iter().skip(1) {
        if pop.individuals[idx].fit > winner.fit {
            winner = &pop.individuals[idx];
        }
    }
    winner
}

/// Uniform crossover: each bit inherited from either parent with
/// probability 0.5. Identical parents therefore produce an identical child.
pub fn uniform_crossover(
    parent1: &Individual,
    parent2: &Individual,
    rng: &mut ChaCha8Rng,
) -> Individual {
    let mut child = Individual::new(parent1.mask.len());
    child.mask = parent1
        .mask
        .iter()
        .zip(parent2.mask.iter())
        .map(|(&a, &b)| if rng.gen_bool(0.5) { a } else { b })
        .collect();
    child.count_k();
    child
}

/// Bit-flip mutation: each bit flipped independently with the given rate.
pub fn mutate(individual: &mut Individual, rate: f64, rng: &mut ChaCha8Rng) {
    for bit in individual.mask.iter_mut() {
        if rng.gen::<f64>() < rate {
            *bit = !*bit;
        }
    }
    individual.count_k();
}

/// Run the genetic feature-selection search.
///
/// Generations execute sequentially; within a generation the fitness of all
/// new individuals is evaluated in parallel. The `running` flag is checked
/// between generations only, so cancellation never truncates an evaluation.
pub fn ga(
    data: &Dataset,
    backend: &dyn Classifier,
    param: &Param,
    running: Arc<AtomicBool>,
) -> Result<GaOutcome, CoreError> {
    let time = Instant::now();
    crate::param::validate(param)?;
    data.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);
    let evaluator = FitnessEvaluator::new(data, backend, param.cv.folds, &mut rng)?;
    let failures = AtomicUsize::new(0);

    // Initialize and score the first generation
    let mut pop = Population::generate(param.ga.population_size, data.feature_len, &mut rng);
    pop.evaluate(&evaluator, param.ga.sparsity_weight, &failures);
    pop = pop.sort();

    let mut best = pop.individuals[0].clone();
    let mut best_accuracy = pop
        .individuals
        .iter()
        .map(|i| i.accuracy)
        .fold(0.0_f64, f64::max);
    let mut history: Vec<EvolutionRecord> = Vec::with_capacity(param.ga.generations);

    info!(
        "Initial population: {} individuals over {} features, best fit {:.3}",
        pop.individuals.len(),
        data.feature_len,
        best.fit
    );

    for generation in 1..=param.ga.generations {
        let diversity = pop.diversity();
        let mutation_rate = adapt_mutation_rate(diversity, &param.ga);

        // Elites survive by value, fitness untouched
        let mut next = Population::new();
        next.individuals
            .extend(pop.individuals.iter().take(param.ga.elite_count).cloned());

        // Fill the remaining slots with evaluated offspring
        let mut children = Population::new();
        while next.individuals.len() + children.individuals.len() < param.ga.population_size {
            let parent1 = tournament(&pop, param.ga.tournament_size, &mut rng);
            let parent2 = tournament(&pop, param.ga.tournament_size, &mut rng);
            let mut child = uniform_crossover(parent1, parent2, &mut rng);
            mutate(&mut child, mutation_rate, &mut rng);
            child.repair(&mut rng);
            child.epoch = generation;
            children.individuals.push(child);
        }
        children.evaluate(&evaluator, param.ga.sparsity_weight, &failures);

        next.add(children);
        pop = next.sort();

        // Strictly greater fitness replaces the global best; ties keep the
        // earlier find.
        let candidate = &pop.individuals[0];
        if candidate.fit > best.fit {
            best = candidate.clone();
            debug!(
                "New global best at generation {}: fit {:.3}, accuracy {:.3}, k={}",
                generation, best.fit, best.accuracy, best.k
            );
        }
        let generation_best_accuracy = pop
            .individuals
            .iter()
            .map(|i| i.accuracy)
            .fold(0.0_f64, f64::max);
        if generation_best_accuracy > best_accuracy {
            best_accuracy = generation_best_accuracy;
        }

        history.push(EvolutionRecord {
            generation,
            best_fit: best.fit,
            best_accuracy,
            avg_accuracy: pop.mean_accuracy(),
            avg_fit: pop.mean_fit(),
            best_k: best.k,
            diversity,
            mutation_rate,
        });

        info!(
            "Generation {:>4} | best fit {:.3} | best acc {:.3} | avg acc {:.3} | k={} | diversity {:.3} | rate {:.3}",
            generation, best.fit, best_accuracy, pop.mean_accuracy(), best.k, diversity, mutation_rate
        );

        if !running.load(Ordering::Relaxed) {
            info!("Stop signal received after generation {}", generation);
            break;
        }
    }

    info!(
        "Genetic search completed {} generations in {:.2?}",
        history.len(),
        time.elapsed()
    );

    Ok(GaOutcome {
        best,
        history,
        evaluation_failures: failures.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GaussianNb;

    fn param_for_tests() -> Param {
        let mut param = Param::default();
        param.general.seed = 42;
        param.ga.population_size = 20;
        param.ga.generations = 22;
        param.ga.base_mutation_rate = 0.1;
        param.ga.elite_count = 2;
        param.ga.tournament_size = 3;
        param.cv.folds = 4;
        param
    }

    /// 10 features where only columns 0 and 3 separate the classes.
    fn synthetic_data(samples: usize, seed: u64) -> Dataset {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut rows = Vec::with_capacity(samples);
        let mut y = Vec::with_capacity(samples);
        for i in 0..samples {
            let class = (i % 2) as u8;
            let shift = if class == 0 { -0.8 } else { 0.8 };
            let mut row: Vec<f64> = (0..10).map(|_| rng.gen_range(-1.0..1.0)).collect();
            row[0] += shift;
            row[3] += shift;
            rows.push(row);
            y.push(class);
        }
        let names = (0..10).map(|i| format!("f{}", i)).collect();
        Dataset::from_parts(rows, y, names).unwrap()
    }

    fn fixed_individual(mask: Vec<bool>, fit: f64) -> Individual {
        let mut individual = Individual::new(mask.len());
        individual.mask = mask;
        individual.count_k();
        individual.fit = fit;
        individual
    }

    #[test]
    fn test_fitness_penalty_is_bounded_by_sparsity_weight() {
        // Full mask pays the whole weight, a sliver of it pays almost nothing
        assert_eq!(fitness(0.9, 1.0, 0.05), 0.9 - 0.05);
        assert!(fitness(0.9, 0.05, 0.05) > 0.899);

        // Equal accuracy ranks the smaller mask first
        assert!(fitness(0.8, 0.2, 0.05) > fitness(0.8, 0.9, 0.05));

        // A larger accuracy gap than the weight can never be inverted
        assert!(fitness(0.9, 1.0, 0.05) > fitness(0.84, 0.0, 0.05));
    }

    #[test]
    fn test_adapt_mutation_rate_piecewise_and_clamped() {
        let mut ga = Param::default().ga;
        ga.base_mutation_rate = 0.1;

        assert!((adapt_mutation_rate(0.1, &ga) - 0.15).abs() < 1e-12);
        assert_eq!(adapt_mutation_rate(0.3, &ga), 0.1);
        assert!((adapt_mutation_rate(0.5, &ga) - 0.07).abs() < 1e-12);

        ga.base_mutation_rate = 0.25;
        assert_eq!(adapt_mutation_rate(0.1, &ga), ga.max_mutation_rate);

        ga.base_mutation_rate = 0.012;
        assert_eq!(adapt_mutation_rate(0.5, &ga), ga.min_mutation_rate);
    }

    #[test]
    fn test_tournament_prefers_higher_fit() {
        let mut pop = Population::new();
        for i in 0..10 {
            pop.individuals
                .push(fixed_individual(vec![true, false], i as f64 / 10.0));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        // A tournament over the whole population must return the single best
        let winner = tournament(&pop, 10, &mut rng);
        assert_eq!(winner.fit, 0.9);
    }

    #[test]
    fn test_uniform_crossover_of_identical_parents_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let parent = fixed_individual(vec![true, false, true, true, false, false], 0.5);
        for _ in 0..20 {
            let child = uniform_crossover(&parent, &parent, &mut rng);
            assert_eq!(child.mask, parent.mask);
            assert_eq!(child.k, parent.k);
        }
    }

    #[test]
    fn test_mutate_recounts_k_and_repair_covers_empty_masks() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut individual = fixed_individual(vec![true, false, true, false], 0.0);
        mutate(&mut individual, 1.0, &mut rng);
        // Rate 1.0 flips every bit
        assert_eq!(individual.mask, vec![false, true, false, true]);
        assert_eq!(individual.k, 2);

        let mut empty = fixed_individual(vec![true, true], 0.0);
        mutate(&mut empty, 1.0, &mut rng);
        assert_eq!(empty.k, 0);
        empty.repair(&mut rng);
        assert_eq!(empty.k, 1);
    }

    #[test]
    fn test_best_accuracy_is_monotone_over_generations() {
        let data = synthetic_data(120, 7);
        let backend = GaussianNb::default();
        let param = param_for_tests();
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&data, &backend, &param, running).unwrap();
        assert_eq!(outcome.history.len(), 22);

        let mut previous = 0.0;
        for record in &outcome.history {
            assert!(
                record.best_accuracy >= previous,
                "best accuracy regressed at generation {}",
                record.generation
            );
            previous = record.best_accuracy;
        }
    }

    #[test]
    fn test_diversity_and_mutation_rate_stay_in_bounds() {
        let data = synthetic_data(120, 7);
        let backend = GaussianNb::default();
        let param = param_for_tests();
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&data, &backend, &param, running).unwrap();
        for record in &outcome.history {
            assert!((0.0..=1.0).contains(&record.diversity));
            assert!(record.mutation_rate >= param.ga.min_mutation_rate);
            assert!(record.mutation_rate <= param.ga.max_mutation_rate);
        }
    }

    #[test]
    fn test_best_mask_always_selects_at_least_one_feature() {
        let data = synthetic_data(80, 3);
        let backend = GaussianNb::default();
        let mut param = param_for_tests();
        param.ga.generations = 5;
        let running = Arc::new(AtomicBool::new(true));

        let outcome = ga(&data, &backend, &param, running).unwrap();
        assert!(outcome.best.k >= 1);
        assert_eq!(
            outcome.best.k,
            outcome.best.mask.iter().filter(|&&b| b).count()
        );
    }

    #[test]
    fn test_cancellation_between_generations_returns_partial_history() {
        let data = synthetic_data(80, 3);
        let backend = GaussianNb::default();
        let param = param_for_tests();
        let running = Arc::new(AtomicBool::new(false));

        let outcome = ga(&data, &backend, &param, running).unwrap();
        assert_eq!(outcome.history.len(), 1);
        assert!(outcome.best.k >= 1);
    }

    #[test]
    fn test_invalid_config_aborts_before_evolution() {
        let data = synthetic_data(80, 3);
        let backend = GaussianNb::default();
        let mut param = param_for_tests();
        param.ga.population_size = 1;
        let running = Arc::new(AtomicBool::new(true));

        assert!(matches!(
            ga(&data, &backend, &param, running),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_is_reproducible_for_a_fixed_seed() {
        let data = synthetic_data(100, 11);
        let backend = GaussianNb::default();
        let param = param_for_tests();

        let a = ga(&data, &backend, &param, Arc::new(AtomicBool::new(true))).unwrap();
        let b = ga(&data, &backend, &param, Arc::new(AtomicBool::new(true))).unwrap();

        assert_eq!(a.best.mask, b.best.mask);
        assert_eq!(a.history, b.history);
    }
}
