mod common;

use racetrack::{
    config::{EvaluationConfig, TrainingConfig},
    evaluation::evaluate_policy,
    learning::{Algorithm, TdLearner},
    pipeline::{MetricsObserver, TrainingPipeline},
    racetrack::{CellType, CrashPolicy, Position, Velocity},
};
use rand::{SeedableRng, rngs::StdRng};

#[test]
fn test_finish_states_absorb() {
    for algorithm in [Algorithm::QLearning, Algorithm::Sarsa] {
        let mut track = common::square();
        let config = TrainingConfig::new(algorithm)
            .with_max_epochs(20)
            .with_seed(5);
        TrainingPipeline::new(config).run(&mut track).unwrap();

        for state in track.states().iter().filter(|s| s.cell == CellType::Finish) {
            assert_eq!(state.value, 0.0);
            assert!(track.actions().edges_of(state.id).is_empty());
            assert!(track.best_action(state.id).is_none());
        }
    }
}

#[test]
fn test_learning_rate_tracks_visit_count() {
    let mut track = common::l_track(CrashPolicy::StopBeforeWall);
    let config = TrainingConfig::new(Algorithm::QLearning)
        .with_max_epochs(10)
        .with_tau(50.0)
        .with_threshold(0.0)
        .with_seed(21);
    let result = TrainingPipeline::new(config).run(&mut track).unwrap();
    assert_eq!(result.episodes, 10 * 11);

    let visited: Vec<_> = track
        .actions()
        .iter()
        .filter(|edge| edge.times_visited > 0)
        .collect();
    assert!(!visited.is_empty());
    for edge in visited {
        let expected = 50.0 / (50.0 + f64::from(edge.times_visited - 1));
        assert!((edge.learning_rate - expected).abs() < 1e-12);
        assert!(edge.q_value < 0.0, "{edge:?}");
    }
}

#[test]
fn test_exploration_rate_matches_epsilon() {
    let mut track = common::square();
    track.seed_q_values(&mut StdRng::seed_from_u64(1), 0.01);
    let state = track
        .states()
        .lookup(Position::new(1, 1), Velocity::ZERO)
        .unwrap();

    let config = TrainingConfig::new(Algorithm::Sarsa)
        .with_epsilon(0.2)
        .with_seed(99);
    let mut learner = TdLearner::from_config(&config);

    let draws = 10_000;
    let mut explored = 0;
    let mut off_greedy = 0;
    for _ in 0..draws {
        let selection = learner.select(&track, state).unwrap();
        if selection.explored {
            explored += 1;
        }
        if selection.chosen != selection.greedy {
            off_greedy += 1;
        }
    }

    let explored = explored as f64 / draws as f64;
    let off_greedy = off_greedy as f64 / draws as f64;
    assert!((explored - 0.2).abs() < 0.02, "explored {explored}");
    // a uniform pick over nine edges lands on the greedy one a ninth of the time
    assert!((off_greedy - 0.2 * 8.0 / 9.0).abs() < 0.02, "off greedy {off_greedy}");
}

#[test]
fn test_zero_epsilon_is_greedy() {
    let mut track = common::square();
    track.seed_q_values(&mut StdRng::seed_from_u64(2), 0.01);
    let state = track.states().resting_starts().next().unwrap().id;

    let config = TrainingConfig::new(Algorithm::QLearning)
        .with_epsilon(0.0)
        .with_seed(4);
    let mut learner = TdLearner::from_config(&config);
    let greedy = track.best_action(state).unwrap();
    for _ in 0..100 {
        let selection = learner.select(&track, state).unwrap();
        assert!(!selection.explored);
        assert_eq!(selection.chosen, greedy);
    }
}

#[test]
fn test_metrics_observer_sees_every_episode() {
    use std::sync::{Arc, Mutex};

    use racetrack::{
        learning::{EpisodeReport, EpochReport},
        ports::TrainingObserver,
    };

    struct Shared(Arc<Mutex<MetricsObserver>>);

    impl TrainingObserver for Shared {
        fn on_episode_end(&mut self, epoch: usize, episode: &EpisodeReport) -> racetrack::Result<()> {
            self.0.lock().unwrap().on_episode_end(epoch, episode)
        }

        fn on_epoch_end(&mut self, report: &EpochReport) -> racetrack::Result<()> {
            self.0.lock().unwrap().on_epoch_end(report)
        }
    }

    let metrics = Arc::new(Mutex::new(MetricsObserver::new()));
    let mut track = common::corridor();
    let config = TrainingConfig::new(Algorithm::Sarsa)
        .with_max_epochs(4)
        .with_episodes_per_epoch(5)
        .with_max_steps_per_episode(300)
        .with_threshold(0.0)
        .with_seed(8);
    let result = TrainingPipeline::new(config)
        .with_observer(Box::new(Shared(Arc::clone(&metrics))))
        .run(&mut track)
        .unwrap();

    let metrics = metrics.lock().unwrap();
    assert_eq!(result.epochs, 4);
    assert_eq!(metrics.deltas().len(), 4);
    assert_eq!(metrics.episode_lengths().len(), 20);
    assert!(metrics.episode_lengths().iter().all(|&steps| (1..=300).contains(&steps)));

    let visits: u32 = track.actions().iter().map(|edge| edge.times_visited).sum();
    assert_eq!(visits as usize, metrics.episode_lengths().iter().sum::<usize>());
}

#[test]
fn test_td_learners_drive_the_corridor_in_three_steps() {
    for algorithm in [Algorithm::QLearning, Algorithm::Sarsa] {
        let mut track = common::corridor();
        let config = TrainingConfig::new(algorithm)
            .with_seed(3)
            .with_max_epochs(300);
        TrainingPipeline::new(config).run(&mut track).unwrap();

        let evaluation = EvaluationConfig::default()
            .with_episodes(50)
            .with_max_steps(50)
            .with_success_probability(1.0)
            .with_seed(3);
        let outcomes = evaluate_policy(&track, &evaluation).unwrap();
        assert_eq!(outcomes.len(), 50);
        assert!(
            outcomes.iter().all(|o| o.reached_finish && o.steps == 3),
            "{algorithm}: {outcomes:?}"
        );
    }
}
