use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use laundry_robot::agent::ScriptedAgent;
use laundry_robot::table::State;
use laundry_robot::{
    Action, Agent, AgentOptions, AgentRegistry, AgentReport, Env, EnvConfig, Error, Pos,
    QLearningAgent, QLearningConfig, Senses,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scenario_room(iterations: usize) -> Env {
    let config = EnvConfig::default().size(4).iterations(iterations);
    Env::with_layout(&config, Pos::new(1, 1), Pos::new(1, 1), Pos::new(3, 3)).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Created,
    GetAction,
    Rewarded(Action, i32, Pos),
    Updated(Pos, bool, i64),
    Finished,
}

/// Walks right forever and writes down every hook call.
struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
    fail_on_update: bool,
}

impl Agent for Recorder {
    fn created(&mut self, _senses: &Senses) -> Result<()> {
        self.calls.borrow_mut().push(Call::Created);
        Ok(())
    }

    fn get_action(&mut self, _senses: &Senses) -> Result<Action> {
        self.calls.borrow_mut().push(Call::GetAction);
        Ok(Action::Right)
    }

    fn rewarded(&mut self, senses: &Senses, action: Action, reward: i32) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::Rewarded(action, reward, senses.position()));
        Ok(())
    }

    fn updated(&mut self, senses: &Senses) -> Result<()> {
        if self.fail_on_update {
            bail!("cannot learn");
        }
        self.calls.borrow_mut().push(Call::Updated(
            senses.position(),
            senses.has_laundry(),
            senses.score(),
        ));
        Ok(())
    }

    fn finished(&mut self, _senses: &Senses) -> Result<Option<AgentReport>> {
        self.calls.borrow_mut().push(Call::Finished);
        Ok(None)
    }
}

#[test]
fn collect_and_deposit() -> Result<()> {
    init_logger();
    let mut env = scenario_room(6);
    let mut agent = ScriptedAgent::parse("collect, down, down, right, right, place");

    let episode = env.run(&mut agent)?;

    assert_eq!(episode.score, 30);
    assert_eq!(episode.turns, 6);
    assert_eq!(env.room().robot, Pos::new(3, 3));
    assert!(!env.room().has_laundry);
    let report = episode.report.unwrap();
    assert_eq!(report.score_history, vec![0, 10, 10, 10, 10, 10, 30]);
    Ok(())
}

#[test]
fn dropping_laundry_on_the_floor() -> Result<()> {
    let mut env = scenario_room(3);
    let mut agent = ScriptedAgent::parse("collect, down, place");
    let episode = env.run(&mut agent)?;
    assert_eq!(episode.score, 10 - 8);
    Ok(())
}

#[test]
fn hooks_run_in_protocol_order() -> Result<()> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut agent = Recorder {
        calls: calls.clone(),
        fail_on_update: false,
    };
    let config = EnvConfig::default().size(4).iterations(4);
    let mut env = Env::with_layout(&config, Pos::new(0, 1), Pos::new(2, 2), Pos::new(3, 3))?;

    env.run(&mut agent)?;

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1 + 4 * 3 + 1);
    assert_eq!(calls[0], Call::Created);
    assert_eq!(calls[calls.len() - 1], Call::Finished);
    // rewarded sees the room before the move, updated after it
    assert_eq!(
        calls[1..7].to_vec(),
        vec![
            Call::GetAction,
            Call::Rewarded(Action::Right, 0, Pos::new(0, 1)),
            Call::Updated(Pos::new(0, 2), false, 0),
            Call::GetAction,
            Call::Rewarded(Action::Right, 0, Pos::new(0, 2)),
            Call::Updated(Pos::new(0, 3), false, 0),
        ]
    );
    // walking into the wall changes nothing
    assert_eq!(calls[9], Call::Updated(Pos::new(0, 3), false, 0));
    for turn in calls[1..calls.len() - 1].chunks(3) {
        assert_eq!(turn[0], Call::GetAction);
        assert!(matches!(turn[1], Call::Rewarded(..)));
        assert!(matches!(turn[2], Call::Updated(..)));
    }
    Ok(())
}

#[test]
fn invalid_action_aborts_the_run() {
    let mut env = scenario_room(10);
    let mut agent = ScriptedAgent::parse("collect, jump, place");

    let err = env.run(&mut agent).unwrap_err();

    assert!(matches!(err, Error::InvalidAction(ref name) if name == "jump"));
    // the collect of the first turn happened, nothing after the bad action did
    assert_eq!(env.room().score, 10);
    assert!(env.room().has_laundry);
}

#[test]
fn failing_hook_aborts_the_run() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut agent = Recorder {
        calls: calls.clone(),
        fail_on_update: true,
    };
    let mut env = scenario_room(10);

    let err = env.run(&mut agent).unwrap_err();

    assert!(matches!(err, Error::AgentHook { hook: "updated", .. }));
    assert!(!calls.borrow().contains(&Call::Finished));
}

#[test]
fn registry_builds_runnable_agents() -> Result<()> {
    let registry = AgentRegistry::with_builtin();
    let opts = AgentOptions {
        seed: Some(11),
        ..AgentOptions::default()
    };
    for name in ["qlearning", "random"].iter() {
        let mut agent = registry.build(name, &opts)?;
        let mut env = Env::new(&EnvConfig::default().size(3).iterations(500).seed(10));
        let episode = env.run(agent.as_mut())?;
        let report = episode.report.unwrap();
        assert_eq!(report.score_history.len(), 501);
        assert_eq!(report.score_history.last(), Some(&episode.score));
    }
    Ok(())
}

#[test]
fn q_learning_finds_the_laundry_and_the_hamper() -> Result<()> {
    init_logger();
    let config = EnvConfig::default().size(3).iterations(300_000);
    let laundry = Pos::new(0, 2);
    let hamper = Pos::new(2, 0);
    let mut env = Env::with_layout(&config, Pos::new(1, 1), laundry, hamper)?;
    let mut agent = QLearningAgent::new(QLearningConfig::default().seed(42));

    let episode = env.run(&mut agent)?;

    assert!(episode.score > 0);
    let best = episode.report.unwrap().best_actions.unwrap();
    let at_laundry = State {
        row: laundry.row,
        col: laundry.col,
        has_laundry: false,
    };
    let at_hamper = State {
        row: hamper.row,
        col: hamper.col,
        has_laundry: true,
    };
    assert_eq!(best.get(at_laundry), Action::Collect);
    assert_eq!(best.get(at_hamper), Action::Place);
    Ok(())
}
