//! Lesson progress tracking over broadcast events.

use termsim_types::config::{LessonConfig, MissionSpec};
use termsim_types::criterion::Criterion;
use termsim_types::event::Event;

/// One lesson step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub id: String,
    pub text: String,
    pub criterion: Criterion,
    pub completed: bool,
}

/// Ordered missions of a lesson. Each completes at most once.
#[derive(Debug, Clone, Default)]
pub struct MissionBoard {
    missions: Vec<Mission>,
}

impl MissionBoard {
    pub fn new(specs: &[MissionSpec]) -> Self {
        Self {
            missions: specs
                .iter()
                .map(|s| Mission {
                    id: s.id.clone(),
                    text: s.text.clone(),
                    criterion: s.criterion.clone(),
                    completed: false,
                })
                .collect(),
        }
    }

    pub fn from_config(lesson: &LessonConfig) -> Self {
        Self::new(&lesson.missions)
    }

    /// Feed one event. Returns the ids of missions it completed.
    pub fn observe(&mut self, event: &Event) -> Vec<String> {
        let mut done = Vec::new();
        for mission in self.missions.iter_mut().filter(|m| !m.completed) {
            if mission.criterion.matches(event) {
                mission.completed = true;
                log::info!("mission completed: {}", mission.id);
                done.push(mission.id.clone());
            }
        }
        done
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    /// (completed, total).
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.missions.iter().filter(|m| m.completed).count();
        (completed, self.missions.len())
    }

    /// True once every mission is done. An empty board is never complete.
    pub fn all_completed(&self) -> bool {
        !self.missions.is_empty() && self.missions.iter().all(|m| m.completed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::Terminal;
    use termsim_types::config::{Account, TargetConfig};
    use termsim_types::event::AuthMethod;

    fn root_port_lesson() -> LessonConfig {
        let toml_str = r#"
[target]
port = 1234
accounts = [{ user = "root", password = "toor" }]
confirm_host_key = false

[[missions]]
id = "port"
text = "Connect on port 1234"
criterion = { kind = "commandText", contains = ["ssh", "-p 1234"] }

[[missions]]
id = "root"
text = "Log in as root"
criterion = { kind = "connected", user = "root" }

[[missions]]
id = "whoami"
text = "Check who you are"
criterion = { kind = "command", name = "whoami" }
"#;
        LessonConfig::from_toml_str(toml_str).unwrap()
    }

    #[test]
    fn missions_complete_once() {
        let mut board = MissionBoard::new(&[MissionSpec {
            id: "keygen".into(),
            text: "Generate a key".into(),
            criterion: Criterion::KeygenDone,
        }]);
        assert_eq!(board.observe(&Event::KeygenDone), vec!["keygen".to_string()]);
        assert!(board.observe(&Event::KeygenDone).is_empty());
        assert!(board.all_completed());
        assert_eq!(board.progress(), (1, 1));
    }

    #[test]
    fn empty_board_is_not_complete() {
        assert!(!MissionBoard::default().all_completed());
    }

    #[test]
    fn connected_by_key_criterion() {
        let mut board = MissionBoard::new(&[MissionSpec {
            id: "key".into(),
            text: "Log in without a password".into(),
            criterion: Criterion::Connected {
                user: None,
                method: Some(AuthMethod::Key),
            },
        }]);
        let by_password = Event::Connected {
            user: "alumno".into(),
            host: "192.168.1.43".into(),
            method: AuthMethod::Password,
        };
        assert!(board.observe(&by_password).is_empty());
        let by_key = Event::Connected {
            user: "alumno".into(),
            host: "192.168.1.43".into(),
            method: AuthMethod::Key,
        };
        assert_eq!(board.observe(&by_key), vec!["key".to_string()]);
    }

    #[test]
    fn root_over_custom_port_lesson() {
        let lesson = root_port_lesson();
        assert_eq!(
            lesson.target.accounts,
            vec![Account {
                user: "root".into(),
                password: Some("toor".into())
            }]
        );
        let board = Rc::new(RefCell::new(MissionBoard::from_config(&lesson)));
        let mut term = Terminal::new(lesson).unwrap();
        let listener = Rc::clone(&board);
        term.subscribe(move |event| {
            listener.borrow_mut().observe(event);
        });

        term.submit("ssh root@192.168.1.43");
        assert_eq!(board.borrow().progress(), (0, 3));

        term.submit("ssh root@192.168.1.43 -p 1234");
        assert_eq!(term.dialogue_kind(), Some("password"));
        term.submit("toor");
        assert_eq!(term.session().user, "root");
        term.submit("whoami");

        assert!(board.borrow().all_completed());
        assert_eq!(board.borrow().progress(), (3, 3));
    }

    #[test]
    fn default_target_rejects_missing_port_flag() {
        let lesson = LessonConfig {
            target: TargetConfig {
                port: 1234,
                ..TargetConfig::default()
            },
            ..LessonConfig::default()
        };
        let mut term = Terminal::new(lesson).unwrap();
        term.submit("ssh alumno@192.168.1.43");
        assert_eq!(term.dialogue_kind(), None);
        assert_eq!(
            term.transcript().last().unwrap().text,
            "ssh: connect to host 192.168.1.43 port 22: Connection refused"
        );
    }
}
