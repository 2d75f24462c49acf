/*!
Observable state container.

Readers subscribe to a projection of the state and are called only when that projection
changes. Writers go through [`Store::update`], which compares before notifying, so writing a
value that is already current is silent.

Stores are owned by the caller and passed to the controller by reference; there is no global
instance.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Notifier<S> = Box<dyn FnMut(&S)>;

pub struct Store<S> {
    state: S,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Notifier<S>)>,
}

impl<S: Clone + PartialEq> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    #[inline]
    pub fn get(&self) -> &S {
        &self.state
    }

    /// Call `listener` with the projected value each time it changes.
    ///
    /// The listener is not called for the current value.
    pub fn subscribe<T, Sel, L>(&mut self, select: Sel, mut listener: L) -> SubscriptionId
    where
        T: PartialEq + 'static,
        Sel: Fn(&S) -> T + 'static,
        L: FnMut(&T) + 'static,
    {
        let mut last = select(&self.state);
        let notifier: Notifier<S> = Box::new(move |state: &S| {
            let next = select(state);
            if next != last {
                listener(&next);
                last = next;
            }
        });

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, notifier));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    /// Apply `f` to a copy of the state and commit it if anything changed.
    ///
    /// Returns whether the state changed.
    pub fn update(&mut self, f: impl FnOnce(&mut S)) -> bool {
        let mut next = self.state.clone();
        f(&mut next);
        if next == self.state {
            return false;
        }
        self.state = next;
        for (_, notify) in self.subscribers.iter_mut() {
            notify(&self.state);
        }
        true
    }

    pub fn set(&mut self, value: S) -> bool {
        self.update(|s| *s = value)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<S: Clone + PartialEq + Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
