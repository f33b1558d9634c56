use crate::model::{Message, MessageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub expandable: bool,
    /// Initial state of an expandable history
    pub start_expanded: bool,
    pub show_compose_button: bool,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            expandable: true,
            start_expanded: false,
            show_compose_button: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    ScrollToQuote(MessageId),
    DeleteConversation,
    Compose,
}

/// User-controlled part of the history: expansion and the entry cursor.
#[derive(Debug, Clone)]
pub struct HistoryState {
    options: HistoryOptions,
    expanded: bool,
    selected: usize,
}

impl HistoryState {
    pub fn new(options: HistoryOptions) -> Self {
        Self {
            options,
            expanded: options.start_expanded,
            selected: 0,
        }
    }

    pub fn options(&self) -> HistoryOptions {
        self.options
    }

    pub fn is_collapsed(&self) -> bool {
        self.options.expandable && !self.expanded
    }

    /// Flips expansion; always false for a history that is not expandable.
    pub fn toggle_expanded(&mut self) -> bool {
        if !self.options.expandable {
            return false;
        }
        self.expanded = !self.expanded;
        true
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let last = len as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last);
        self.selected = next as usize;
    }

    pub fn select_message(&mut self, conversation: &[Message], id: &MessageId) {
        if let Some(idx) = conversation.iter().position(|message| &message.id == id) {
            self.selected = idx;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry<'a> {
    pub index: usize,
    pub message: &'a Message,
    pub is_active: bool,
    pub is_selected: bool,
    /// Only the header and the precomputed preview are shown
    pub collapsed: bool,
    pub quoted: Option<&'a Message>,
}

/// Borrowed view over a thread, ready to be drawn.
#[derive(Debug, Clone, Copy)]
pub struct ConversationHistory<'a> {
    conversation: &'a [Message],
    active_message_id: Option<&'a MessageId>,
    state: &'a HistoryState,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(
        conversation: &'a [Message],
        active_message_id: Option<&'a MessageId>,
        state: &'a HistoryState,
    ) -> Self {
        Self {
            conversation,
            active_message_id,
            state,
        }
    }

    pub fn len(&self) -> usize {
        self.conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn state(&self) -> &'a HistoryState {
        self.state
    }

    pub fn active_message_id(&self) -> Option<&'a MessageId> {
        self.active_message_id
    }

    pub fn entries(&self) -> impl Iterator<Item = HistoryEntry<'a>> + 'a {
        let conversation = self.conversation;
        let active = self.active_message_id;
        let collapsed = self.state.is_collapsed();
        let selected = self.state.selected();
        conversation
            .iter()
            .enumerate()
            .map(move |(index, message)| HistoryEntry {
                index,
                message,
                is_active: active == Some(&message.id),
                is_selected: index == selected,
                collapsed,
                quoted: message.quote.as_ref().and_then(|quote| {
                    conversation
                        .iter()
                        .find(|candidate| candidate.id == quote.message_id)
                }),
            })
    }

    pub fn active_index(&self) -> Option<usize> {
        let active = self.active_message_id?;
        self.conversation
            .iter()
            .position(|message| &message.id == active)
    }

    pub fn selected_message(&self) -> Option<&'a Message> {
        self.conversation.get(self.state.selected())
    }

    pub fn follow_selected_quote(&self) -> Option<HistoryEvent> {
        let quote = self.selected_message()?.quote.as_ref()?;
        Some(HistoryEvent::ScrollToQuote(quote.message_id.clone()))
    }

    /// No confirmation happens here; callers decide whether to ask first.
    pub fn request_delete(&self) -> HistoryEvent {
        HistoryEvent::DeleteConversation
    }

    pub fn shows_compose_button(&self) -> bool {
        self.state.options().show_compose_button
    }

    pub fn request_compose(&self) -> Option<HistoryEvent> {
        self.shows_compose_button().then_some(HistoryEvent::Compose)
    }
}
