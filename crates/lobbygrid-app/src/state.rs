// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::LobbyList;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyState {
    pub active_list: LobbyList,
    pub status_line: Option<String>,
}

impl Default for LobbyState {
    fn default() -> Self {
        Self {
            active_list: LobbyList::Users,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyCommand {
    NextList,
    PrevList,
    ShowList(LobbyList),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    ListChanged(LobbyList),
    StatusUpdated(String),
    StatusCleared,
}

impl LobbyState {
    pub fn dispatch(&mut self, command: LobbyCommand) -> Vec<LobbyEvent> {
        match command {
            LobbyCommand::NextList => self.rotate_list(1),
            LobbyCommand::PrevList => self.rotate_list(-1),
            LobbyCommand::ShowList(list) => {
                if self.active_list == list {
                    return Vec::new();
                }
                self.active_list = list;
                vec![LobbyEvent::ListChanged(list)]
            }
            LobbyCommand::SetStatus(message) => vec![self.set_status(&message)],
            LobbyCommand::ClearStatus => {
                self.status_line = None;
                vec![LobbyEvent::StatusCleared]
            }
        }
    }

    fn rotate_list(&mut self, delta: isize) -> Vec<LobbyEvent> {
        let lists = LobbyList::ALL;
        let current = lists
            .iter()
            .position(|list| *list == self.active_list)
            .unwrap_or(0) as isize;
        let len = lists.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_list = lists[next];
        vec![LobbyEvent::ListChanged(self.active_list)]
    }

    fn set_status(&mut self, message: &str) -> LobbyEvent {
        self.status_line = Some(message.to_owned());
        LobbyEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{LobbyCommand, LobbyEvent, LobbyState};
    use crate::LobbyList;

    #[test]
    fn list_rotation_wraps() {
        let mut state = LobbyState {
            active_list: LobbyList::Battles,
            ..LobbyState::default()
        };

        let events = state.dispatch(LobbyCommand::NextList);
        assert_eq!(state.active_list, LobbyList::Users);
        assert_eq!(events, vec![LobbyEvent::ListChanged(LobbyList::Users)]);

        state.dispatch(LobbyCommand::PrevList);
        assert_eq!(state.active_list, LobbyList::Battles);
    }

    #[test]
    fn show_current_list_is_silent() {
        let mut state = LobbyState::default();
        assert!(state.dispatch(LobbyCommand::ShowList(LobbyList::Users)).is_empty());
        assert_eq!(
            state.dispatch(LobbyCommand::ShowList(LobbyList::Battles)),
            vec![LobbyEvent::ListChanged(LobbyList::Battles)]
        );
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = LobbyState::default();

        let events = state.dispatch(LobbyCommand::SetStatus("sorted by rank".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("sorted by rank"));
        assert_eq!(
            events,
            vec![LobbyEvent::StatusUpdated("sorted by rank".to_owned())]
        );

        assert_eq!(
            state.dispatch(LobbyCommand::ClearStatus),
            vec![LobbyEvent::StatusCleared]
        );
        assert_eq!(state.status_line, None);
    }
}
