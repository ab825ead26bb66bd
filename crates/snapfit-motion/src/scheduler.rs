//! The motion scheduler.
//!
//! The host calls [`MotionScheduler::tick`] once per frame. Every active
//! motion advances by the frame time and receives its linear and eased
//! progress. Callers await a [`MotionHandle`] to chain phases; awaiting
//! never blocks other motions.
//!
//! A motion started with a [`PropertyKey`] replaces any in-flight motion
//! on the same key. The replaced motion's handle resolves as
//! [`MotionOutcome::Cancelled`] before the new one runs, so two motions
//! never drive one property and no handle is left dangling.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use crate::easing::Easing;

/// Identifies one animatable property, e.g. the position of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    /// Property name.
    pub property: &'static str,
    /// Owner of the property.
    pub target: u64,
}

impl PropertyKey {
    /// Key for `property` of `target`.
    pub const fn new(property: &'static str, target: u64) -> Self {
        Self { property, target }
    }
}

/// How a motion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Reached its end value.
    Completed,
    /// Superseded or cancelled before the end.
    Cancelled,
}

/// Timing of one motion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimateOptions {
    /// Total duration. Zero completes on the next tick.
    pub duration: Duration,
    /// Progress curve.
    pub easing: Easing,
}

impl AnimateOptions {
    /// Linear motion over `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            easing: Easing::Linear,
        }
    }

    /// Replace the easing curve.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

#[derive(Default)]
struct Completion {
    outcome: Cell<Option<MotionOutcome>>,
    waker: RefCell<Option<Waker>>,
}

impl Completion {
    /// Record the outcome without waking. False if already ended.
    fn settle(&self, outcome: MotionOutcome) -> bool {
        if self.outcome.get().is_some() {
            return false;
        }
        self.outcome.set(Some(outcome));
        true
    }

    fn wake(&self) {
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn resolve(&self, outcome: MotionOutcome) -> bool {
        let settled = self.settle(outcome);
        if settled {
            self.wake();
        }
        settled
    }

    fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }
}

/// Awaitable completion of one motion.
///
/// Resolves exactly once. Dropping the handle does not stop the motion.
#[derive(Clone)]
pub struct MotionHandle {
    completion: Rc<Completion>,
    key: Option<PropertyKey>,
    scheduler: Weak<RefCell<State>>,
}

impl MotionHandle {
    /// The outcome, if the motion has ended.
    pub fn outcome(&self) -> Option<MotionOutcome> {
        self.completion.outcome.get()
    }

    /// True once the motion has ended either way.
    pub fn is_finished(&self) -> bool {
        self.completion.is_resolved()
    }

    /// Stop the motion where it is. Returns false if it had already ended.
    pub fn cancel(&self) -> bool {
        if !self.completion.resolve(MotionOutcome::Cancelled) {
            return false;
        }
        if let (Some(key), Some(state)) = (self.key, self.scheduler.upgrade()) {
            let mut state = state.borrow_mut();
            if state.by_key.get(&key).is_some_and(|c| Rc::ptr_eq(c, &self.completion)) {
                state.by_key.remove(&key);
            }
        }
        true
    }
}

impl Future for MotionHandle {
    type Output = MotionOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<MotionOutcome> {
        match self.completion.outcome.get() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                *self.completion.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl std::fmt::Debug for MotionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionHandle")
            .field("outcome", &self.outcome())
            .finish()
    }
}

type UpdateFn = Box<dyn FnMut(f64, f64)>;

struct MotionTask {
    key: Option<PropertyKey>,
    update: UpdateFn,
    elapsed: Duration,
    duration: Duration,
    easing: Easing,
    completion: Rc<Completion>,
}

impl MotionTask {
    /// Advance by `dt`. Returns true when the motion reached its end.
    fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        let eased = if fraction >= 1.0 {
            1.0
        } else {
            self.easing.apply(fraction)
        };
        (self.update)(fraction, eased);
        fraction >= 1.0
    }
}

#[derive(Default)]
struct State {
    now: Duration,
    tasks: Vec<MotionTask>,
    by_key: HashMap<PropertyKey, Rc<Completion>>,
    /// Completions of the tasks taken out for the current tick.
    in_tick: Vec<Rc<Completion>>,
    ticking: bool,
}

/// Shared, single-threaded motion scheduler.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone, Default)]
pub struct MotionScheduler {
    state: Rc<RefCell<State>>,
}

impl MotionScheduler {
    /// An idle scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a motion. `update` receives `(elapsed_fraction, eased_fraction)`
    /// on every tick until the elapsed fraction reaches 1.
    pub fn animate(
        &self,
        update: impl FnMut(f64, f64) + 'static,
        options: AnimateOptions,
    ) -> MotionHandle {
        self.start(None, Box::new(update), options)
    }

    /// Start a motion on `key`, cancelling any motion already driving it.
    pub fn animate_property(
        &self,
        key: PropertyKey,
        update: impl FnMut(f64, f64) + 'static,
        options: AnimateOptions,
    ) -> MotionHandle {
        self.start(Some(key), Box::new(update), options)
    }

    /// A motion that does nothing for `duration`.
    pub fn delay(&self, duration: Duration) -> MotionHandle {
        self.animate(|_, _| {}, AnimateOptions::new(duration))
    }

    fn start(&self, key: Option<PropertyKey>, update: UpdateFn, options: AnimateOptions) -> MotionHandle {
        let completion = Rc::new(Completion::default());
        let previous = {
            let mut state = self.state.borrow_mut();
            state.tasks.push(MotionTask {
                key,
                update,
                elapsed: Duration::ZERO,
                duration: options.duration,
                easing: options.easing,
                completion: completion.clone(),
            });
            key.and_then(|k| state.by_key.insert(k, completion.clone()))
        };
        // Resolve outside the borrow: waking may poll re-entrantly.
        if let (Some(previous), Some(key)) = (previous, key) {
            if previous.resolve(MotionOutcome::Cancelled) {
                tracing::debug!("motion on {}#{} replaced", key.property, key.target);
            }
        }
        MotionHandle {
            completion,
            key,
            scheduler: Rc::downgrade(&self.state),
        }
    }

    /// Cancel the motion driving `key`. Returns false if none was active.
    pub fn cancel(&self, key: PropertyKey) -> bool {
        let completion = self.state.borrow_mut().by_key.remove(&key);
        completion.is_some_and(|c| c.resolve(MotionOutcome::Cancelled))
    }

    /// Cancel every active motion, including the ones mid-tick when called
    /// from an update callback.
    pub fn cancel_all(&self) -> usize {
        let completions: Vec<Rc<Completion>> = {
            let mut state = self.state.borrow_mut();
            state.by_key.clear();
            state
                .tasks
                .iter()
                .map(|t| t.completion.clone())
                .chain(state.in_tick.iter().cloned())
                .collect()
        };
        completions
            .iter()
            .filter(|c| c.resolve(MotionOutcome::Cancelled))
            .count()
    }

    /// True if a motion is driving `key`.
    pub fn is_animating(&self, key: PropertyKey) -> bool {
        self.state
            .borrow()
            .by_key
            .get(&key)
            .is_some_and(|c| !c.is_resolved())
    }

    /// Number of motions that have not ended.
    pub fn active_count(&self) -> usize {
        self.state
            .borrow()
            .tasks
            .iter()
            .filter(|t| !t.completion.is_resolved())
            .count()
    }

    /// Scheduler clock: total time ticked so far.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Advance every active motion by `dt`.
    ///
    /// Update callbacks may start or cancel motions. Motions started during
    /// a tick first advance on the next tick.
    pub fn tick(&self, dt: Duration) {
        let mut tasks = {
            let mut state = self.state.borrow_mut();
            if state.ticking {
                tracing::warn!("re-entrant tick ignored");
                return;
            }
            state.ticking = true;
            state.now += dt;
            let tasks = mem::take(&mut state.tasks);
            state.in_tick = tasks.iter().map(|t| t.completion.clone()).collect();
            tasks
        };

        // Finished motions settle immediately so a cancel from a later
        // callback cannot overwrite them; wakers fire after the tick.
        let mut finished = Vec::new();
        tasks.retain_mut(|task| {
            if task.completion.is_resolved() {
                return false;
            }
            if task.advance(dt) && task.completion.settle(MotionOutcome::Completed) {
                finished.push(task.completion.clone());
                return false;
            }
            true
        });
        tasks.retain(|task| !task.completion.is_resolved());

        {
            let mut state = self.state.borrow_mut();
            let started = mem::replace(&mut state.tasks, tasks);
            state.tasks.extend(started);
            state.by_key.retain(|_, c| !c.is_resolved());
            state.in_tick.clear();
            state.ticking = false;
        }

        for completion in finished {
            completion.wake();
        }
    }
}

impl std::fmt::Debug for MotionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionScheduler")
            .field("now", &self.now())
            .field("active", &self.active_count())
            .finish()
    }
}
