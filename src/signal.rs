use crate::error::ListenerError;

type Listener<T> = Box<dyn FnMut(&T) -> Result<(), ListenerError> + Send + Sync>;

/// A notification that any number of listeners may subscribe to.
///
/// Listeners run in subscription order. The first one to fail stops the
/// emission and its error goes back to the caller.
pub struct Signal<T> {
    listeners: Vec<Listener<T>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> Signal<T> {
    pub fn connect<F>(&mut self, listener: F)
    where
        F: FnMut(&T) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, value: &T) -> Result<(), ListenerError> {
        for listener in &mut self.listeners {
            listener(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn fan_out() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut signal = Signal::<u32>::default();
        for _ in 0..3 {
            let count = count.clone();
            signal.connect(move |v| {
                count.fetch_add(*v as usize, Ordering::SeqCst);
                Ok(())
            });
        }
        signal.emit(&2).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn failure_stops_emission() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut signal = Signal::<()>::default();
        signal.connect(|_| Err("boom".into()));
        let after = count.clone();
        signal.connect(move |_| {
            after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let err = signal.emit(&()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_signal() {
        let mut signal = Signal::<()>::default();
        assert!(signal.is_empty());
        assert!(signal.emit(&()).is_ok());
    }
}
