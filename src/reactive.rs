//! A minimal observable value.

use std::fmt;

/// A value that notifies its subscribers every time it is set.
pub struct Observable<T> {
    value: T,
    observers: Vec<Box<dyn Fn(&T)>>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            observers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Register an observer. It is not called for the current value.
    pub fn subscribe(&mut self, observer: impl Fn(&T) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Replace the value and notify every observer, in subscription order.
    pub fn set(&mut self, value: T) {
        self.value = value;
        for observer in &self.observers {
            observer(&self.value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.observers.len())
            .finish()
    }
}
