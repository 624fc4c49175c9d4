/// A plain stack of states. Only the top is ever updated or rendered; entry
/// actions are run by the owner right after `push`.
#[derive(Debug)]
pub struct StateStack<S> {
    states: Vec<S>,
}

impl<S> Default for StateStack<S> {
    fn default() -> Self {
        Self { states: Vec::new() }
    }
}

impl<S> StateStack<S> {
    pub fn push(&mut self, state: S) {
        self.states.push(state);
    }

    pub fn pop(&mut self) -> Option<S> {
        self.states.pop()
    }

    pub fn top(&self) -> Option<&S> {
        self.states.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut S> {
        self.states.last_mut()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
