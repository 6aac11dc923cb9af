mod common;
use anyhow::Result;
use common::{init_logger, JointEnv, JointEnvConfig, JointTask, JointTaskConfig};
use mpgym_core::{DefaultEvaluator, Env, Evaluator, Policy};
use mpgym_mp::{
    BlackBoxConfig, BlackBoxEnv, BlackBoxEnvConfig, ControllerConfig, EpisodeState, MpConfig,
    MpError, MpTask, PhaseConfig, ProMpConfig, GeneratorConfig,
};
use ndarray::{arr1, Array1};

fn make(env: JointEnvConfig, task: JointTaskConfig, mp: &MpConfig) -> BlackBoxEnv<JointTask> {
    let env = JointEnv::build(&env, 0).unwrap();
    let task = JointTask::build(&task).unwrap();
    BlackBoxEnv::new(env, task, mp).unwrap()
}

fn task(num_dof: usize) -> JointTaskConfig {
    JointTaskConfig {
        num_dof,
        ..Default::default()
    }
}

fn promp(tau: f64) -> MpConfig {
    MpConfig::default()
        .phase(PhaseConfig::default().tau(tau))
        .generator(GeneratorConfig::ProMP(ProMpConfig::default().num_basis(2)))
}

#[test]
fn test_executes_whole_trajectory() -> Result<()> {
    init_logger();
    let mut env = make(JointEnvConfig::new(2), task(2), &promp(0.5));
    assert_eq!(env.num_params(), 4);

    let obs = env.reset_with_context(None)?;
    assert_eq!(obs, arr1(&[0.0]));

    let step = env.step_trajectory(&arr1(&[0.1, 0.2, -0.3, 0.4]))?;
    assert_eq!(step.info.trajectory_length, 50);
    assert_eq!(step.info.step_rewards.len(), 50);
    assert_eq!(env.env().t, 50);
    // One trajectory per episode without replanning.
    assert!(step.is_truncated);
    assert!(!step.is_terminated);
    assert_eq!(env.replan_state().episode, EpisodeState::Done);

    // 1 + 2 + ... + 50
    assert_eq!(step.reward, 1275.0);
    assert_eq!(step.reward, step.info.step_rewards.iter().sum::<f64>());
    Ok(())
}

#[test]
fn test_early_termination() -> Result<()> {
    let env_config = JointEnvConfig {
        terminate_at: Some(20),
        ..JointEnvConfig::new(1)
    };
    let mut env = make(env_config, task(1), &promp(0.5));
    env.reset_with_context(None)?;

    let step = env.step_trajectory(&arr1(&[1.0, 1.0]))?;
    assert!(step.is_terminated);
    assert_eq!(step.info.step_rewards.len(), 20);
    assert!(step.info.step_rewards.len() < step.info.trajectory_length);
    assert_eq!(step.reward, (1..=20).sum::<usize>() as f64);
    assert_eq!(env.replan_state().episode, EpisodeState::Done);

    let err = env.step_trajectory(&arr1(&[1.0, 1.0])).unwrap_err();
    assert!(matches!(err, MpError::EpisodeFinished));

    // A reset starts a fresh episode.
    env.reset_with_context(None)?;
    assert_eq!(env.replan_state().t, 0);
    assert!(env.step_trajectory(&arr1(&[1.0, 1.0])).is_ok());
    Ok(())
}

#[test]
fn test_step_budget_truncates() -> Result<()> {
    let mp = promp(0.5).black_box(BlackBoxConfig::default().max_episode_steps(Some(30)));
    let mut env = make(JointEnvConfig::new(1), task(1), &mp);
    env.reset_with_context(None)?;

    let step = env.step_trajectory(&arr1(&[0.0, 0.0]))?;
    assert!(step.is_truncated);
    assert!(!step.is_terminated);
    assert_eq!(env.env().t, 30);
    Ok(())
}

#[test]
fn test_empty_trajectory_issues_no_step() -> Result<()> {
    let mut env = make(JointEnvConfig::new(1), task(1), &promp(0.004));
    env.reset_with_context(None)?;

    let err = env.step_trajectory(&arr1(&[0.0, 0.0])).unwrap_err();
    assert!(matches!(err, MpError::EmptyTrajectory { .. }));
    assert_eq!(env.env().t, 0);
    assert_eq!(env.replan_state().plan_count, 0);
    Ok(())
}

#[test]
fn test_invalid_action_issues_no_step() -> Result<()> {
    let mp = promp(0.5).phase(PhaseConfig::default().learn_tau([0.5, 1.5]));
    let mut env = make(JointEnvConfig::new(1), task(1), &mp);
    env.reset_with_context(None)?;

    // wrong length
    let err = env.step_trajectory(&arr1(&[1.0, 0.0])).unwrap_err();
    assert!(matches!(err, MpError::InvalidAction(_)));
    // tau out of bounds
    let err = env.step_trajectory(&arr1(&[2.0, 0.0, 0.0])).unwrap_err();
    assert!(matches!(err, MpError::InvalidAction(_)));
    assert_eq!(env.env().t, 0);
    Ok(())
}

#[test]
fn test_single_plan_per_episode() -> Result<()> {
    // learned tau of 0.62 s leaves 138 steps of the budget unused
    let mp = MpConfig::default()
        .phase(PhaseConfig::default().learn_tau([0.5, 1.5]))
        .black_box(BlackBoxConfig::default().max_episode_steps(Some(200)));
    let mut env = make(JointEnvConfig::new(2), task(2), &mp);
    env.reset_with_context(None)?;

    let mut action = Array1::zeros(env.num_params());
    action[0] = 0.62;
    let step = env.step_trajectory(&action)?;
    assert!(step.is_done());
    assert!(step.is_truncated);

    let state = env.replan_state();
    assert_eq!(state.t, 62);
    assert_eq!(state.plan_count, 1);
    assert_eq!(state.last_replan_step, 0);
    assert_eq!(state.episode, EpisodeState::Done);
    assert!(matches!(
        env.step_trajectory(&action),
        Err(MpError::EpisodeFinished)
    ));
    Ok(())
}

#[test]
fn test_rejected_plan_leaves_env_untouched() -> Result<()> {
    // The bias has the wrong number of entries, which is only detected after
    // the trajectory has been generated.
    let task = JointTaskConfig {
        bias: Some(vec![0.5]),
        ..task(2)
    };
    let mp = MpConfig::default().phase(PhaseConfig::default().learn_tau([0.5, 1.5]));
    let mut env = make(JointEnvConfig::new(2), task, &mp);
    env.reset_with_context(None)?;

    let mut action = Array1::zeros(env.num_params());
    action[0] = 0.62;
    let err = env.step_trajectory(&action).unwrap_err();
    assert!(matches!(err, MpError::InvalidAction(_)));
    assert_eq!(env.env().release_step, None);
    assert_eq!(env.env().t, 0);
    assert_eq!(env.replan_state().plan_count, 0);
    assert_eq!(env.replan_state().episode, EpisodeState::Idle);
    Ok(())
}

#[test]
fn test_step_before_reset() {
    let mut env = make(JointEnvConfig::new(1), task(1), &promp(0.5));
    let err = env.step_trajectory(&arr1(&[0.0, 0.0])).unwrap_err();
    assert!(matches!(err, MpError::NotReset));
}

#[test]
fn test_simulator_fault_is_fatal() -> Result<()> {
    let env_config = JointEnvConfig {
        fail_at: Some(5),
        ..JointEnvConfig::new(1)
    };
    let mut env = make(env_config, task(1), &promp(0.5));
    env.reset_with_context(None)?;
    let err = env.step_trajectory(&arr1(&[0.0, 0.0])).unwrap_err();
    assert!(matches!(err, MpError::SimulatorFault(_)));
    assert_eq!(env.env().t, 4);
    Ok(())
}

#[test]
fn test_context_is_idempotent() -> Result<()> {
    let mut env = make(JointEnvConfig::new(2), task(2), &promp(0.5));
    let obs1 = env.reset_with_context(Some(&[0.25][..]))?;
    let obs2 = env.reset_with_context(Some(&[0.25][..]))?;
    assert_eq!(obs1, arr1(&[0.25]));
    assert_eq!(obs1, obs2);

    assert!(matches!(
        env.reset_with_context(Some(&[0.25, 0.5][..])),
        Err(MpError::InvalidContext(_))
    ));
    assert!(matches!(
        env.reset_with_context(Some(&[3.0][..])),
        Err(MpError::InvalidContext(_))
    ));
    Ok(())
}

#[test]
fn test_mask_length_mismatch() {
    let task = JointTaskConfig {
        mask: Some(vec![true, false]),
        ..task(1)
    };
    let mut env = make(JointEnvConfig::new(1), task, &promp(0.5));
    let err = env.reset_with_context(None).unwrap_err();
    assert!(matches!(err, MpError::ObservationMask { mask: 2, obs: 4 }));
}

#[test]
fn test_learned_tau_sets_trajectory_length() -> Result<()> {
    init_logger();
    let mp = MpConfig::default()
        .phase(PhaseConfig::default().learn_tau([0.5, 1.5]))
        .controller(ControllerConfig::Pd {
            p_gains: vec![1.0],
            d_gains: vec![0.0],
        });
    let mut env = make(JointEnvConfig::new(7), task(7), &mp);
    let num_weights = env.num_weights();
    assert_eq!(env.num_params(), 1 + num_weights);
    env.reset_with_context(None)?;

    let mut action = vec![0.62];
    action.extend(std::iter::repeat(0.1).take(num_weights));
    let step = env.step_trajectory(&Array1::from(action))?;

    assert_eq!(step.info.trajectory_length, 62);
    assert_eq!(step.info.step_rewards.len(), 62);
    assert_eq!(env.env().t, 62);
    assert_eq!(env.env().release_step, Some(62));
    Ok(())
}

#[test]
fn test_position_bias() -> Result<()> {
    let task = JointTaskConfig {
        bias: Some(vec![0.5, -0.5]),
        ..task(2)
    };
    let mut env = make(JointEnvConfig::new(2), task, &promp(0.1));
    env.reset_with_context(None)?;
    env.step_trajectory(&arr1(&[0.0, 0.0, 0.0, 0.0]))?;
    assert!(env.env().commands.iter().all(|c| *c == arr1(&[0.5, -0.5])));
    Ok(())
}

#[test]
fn test_verbose_info() -> Result<()> {
    let mp = promp(0.1).black_box(BlackBoxConfig::default().verbose(2));
    let mut env = make(JointEnvConfig::new(1), task(1), &mp);
    env.reset_with_context(None)?;
    let info = env.step_trajectory(&arr1(&[1.0, 1.0]))?.info;
    assert_eq!(info.positions.map(|p| p.nrows()), Some(10));
    assert_eq!(info.step_actions.map(|a| a.len()), Some(10));
    assert_eq!(info.step_observations.map(|o| o.len()), Some(10));
    let records = info.step_records.unwrap();
    assert_eq!(records.len(), 10);
    assert!(records.iter().all(|r| r.get_scalar("command").is_ok()));

    let mut env = make(JointEnvConfig::new(1), task(1), &promp(0.1));
    env.reset_with_context(None)?;
    let info = env.step_trajectory(&arr1(&[1.0, 1.0]))?.info;
    assert!(info.positions.is_none());
    assert!(info.step_records.is_none());
    Ok(())
}

struct ZeroPolicy(usize);

impl Policy<BlackBoxEnv<JointTask>> for ZeroPolicy {
    fn sample(&mut self, _obs: &Array1<f64>) -> Array1<f64> {
        Array1::zeros(self.0)
    }
}

#[test]
fn test_evaluator_on_wrapped_env() -> Result<()> {
    let config = BlackBoxEnvConfig::<JointTask> {
        env: JointEnvConfig::new(1),
        task: task(1),
        mp: promp(1.0).black_box(BlackBoxConfig::default().max_episode_steps(Some(200))),
    };
    let mut evaluator = DefaultEvaluator::<BlackBoxEnv<JointTask>>::new(&config, 0, 2)?;
    let record = evaluator.evaluate(&mut ZeroPolicy(2))?;

    // a single plan of 100 steps, rewards 1..=100
    assert_eq!(record.get_scalar("Episode return")?, 5050.0);
    assert_eq!(record.get_array1("Episode returns")?, vec![5050.0, 5050.0]);
    Ok(())
}
