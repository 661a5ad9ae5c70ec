//! Explicit timer and animation-frame queue.
//!
//! Time never comes from the wall clock here: the owner advances the
//! scheduler to a `Duration` since start and receives whatever became due.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Clone, Debug)]
struct Timer<T> {
    handle: TaskHandle,
    due: Duration,
    every: Option<Duration>,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_handle: u64,
    timers: Vec<Timer<T>>,
    frame: Vec<(TaskHandle, T)>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 1,
            timers: Vec::new(),
            frame: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn after(&mut self, delay: Duration, task: T) -> TaskHandle {
        let handle = self.next_handle();
        self.timers.push(Timer {
            handle,
            due: self.now + delay,
            every: None,
            task,
        });
        handle
    }

    /// Repeats every `interval`, first firing one interval from now.
    /// A zero interval is bumped to one millisecond.
    pub fn every(&mut self, interval: Duration, task: T) -> TaskHandle {
        let interval = interval.max(Duration::from_millis(1));
        let handle = self.next_handle();
        self.timers.push(Timer {
            handle,
            due: self.now + interval,
            every: Some(interval),
            task,
        });
        handle
    }

    /// Queues `task` for the next [`Scheduler::take_frame`].
    pub fn request_frame(&mut self, task: T) -> TaskHandle {
        let handle = self.next_handle();
        self.frame.push((handle, task));
        handle
    }

    /// Returns true if something was still pending under this handle.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.timers.len() + self.frame.len();
        self.timers.retain(|t| t.handle != handle);
        self.frame.retain(|(h, _)| *h != handle);
        before != self.timers.len() + self.frame.len()
    }

    #[cfg(test)]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle) || self.frame.iter().any(|(h, _)| *h == handle)
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Moves the clock to `now` and returns due timer tasks, earliest first.
    /// Ties keep scheduling order. A repeating task that fell several
    /// intervals behind fires once per missed interval.
    pub fn advance_to(&mut self, now: Duration) -> Vec<T> {
        if now > self.now {
            self.now = now;
        }
        let mut fired: Vec<(Duration, TaskHandle, T)> = Vec::new();
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= self.now)
                .min_by_key(|(_, t)| (t.due, t.handle.0))
                .map(|(idx, _)| idx);
            let Some(idx) = next else { break };
            let timer = &mut self.timers[idx];
            fired.push((timer.due, timer.handle, timer.task.clone()));
            match timer.every {
                Some(interval) => timer.due += interval,
                None => {
                    self.timers.swap_remove(idx);
                }
            }
        }
        fired.into_iter().map(|(_, _, task)| task).collect()
    }

    /// Drains the frame queue. Tasks requested while handling these land in
    /// the next frame.
    pub fn take_frame(&mut self) -> Vec<T> {
        std::mem::take(&mut self.frame)
            .into_iter()
            .map(|(_, task)| task)
            .collect()
    }

    fn next_handle(&mut self) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    mod timers {
        use super::*;

        #[test]
        fn fires_in_due_order() {
            let mut s = Scheduler::new();
            s.after(ms(300), "c");
            s.after(ms(100), "a");
            s.after(ms(200), "b");
            assert_eq!(s.advance_to(ms(250)), vec!["a", "b"]);
            assert_eq!(s.advance_to(ms(300)), vec!["c"]);
            assert!(s.advance_to(ms(1000)).is_empty());
        }

        #[test]
        fn ties_keep_scheduling_order() {
            let mut s = Scheduler::new();
            s.after(ms(10), 1);
            s.after(ms(10), 2);
            s.after(ms(10), 3);
            assert_eq!(s.advance_to(ms(10)), vec![1, 2, 3]);
        }

        #[test]
        fn cancelled_task_never_fires() {
            let mut s = Scheduler::new();
            let keep = s.after(ms(10), "keep");
            let drop = s.after(ms(10), "drop");
            assert!(s.cancel(drop));
            assert!(!s.cancel(drop));
            assert_eq!(s.advance_to(ms(20)), vec!["keep"]);
            assert!(!s.is_pending(keep));
        }

        #[test]
        fn delays_are_relative_to_current_time() {
            let mut s = Scheduler::new();
            s.advance_to(ms(500));
            s.after(ms(100), "x");
            assert!(s.advance_to(ms(599)).is_empty());
            assert_eq!(s.advance_to(ms(600)), vec!["x"]);
        }

        #[test]
        fn time_never_moves_backwards() {
            let mut s: Scheduler<u8> = Scheduler::new();
            s.advance_to(ms(100));
            s.advance_to(ms(50));
            assert_eq!(s.now(), ms(100));
        }
    }

    mod repeating {
        use super::*;

        #[test]
        fn rearms_after_firing() {
            let mut s = Scheduler::new();
            s.every(ms(1000), "tick");
            assert!(s.advance_to(ms(999)).is_empty());
            assert_eq!(s.advance_to(ms(1000)), vec!["tick"]);
            assert_eq!(s.advance_to(ms(2000)), vec!["tick"]);
            assert_eq!(s.pending_timers(), 1);
        }

        #[test]
        fn catches_up_missed_intervals() {
            let mut s = Scheduler::new();
            s.every(ms(100), "tick");
            assert_eq!(s.advance_to(ms(350)).len(), 3);
        }

        #[test]
        fn interleaves_with_one_shots() {
            let mut s = Scheduler::new();
            s.every(ms(100), "tick");
            s.after(ms(150), "once");
            assert_eq!(s.advance_to(ms(200)), vec!["tick", "once", "tick"]);
        }

        #[test]
        fn cancel_stops_repeats() {
            let mut s = Scheduler::new();
            let h = s.every(ms(100), "tick");
            s.advance_to(ms(100));
            s.cancel(h);
            assert!(s.advance_to(ms(1000)).is_empty());
        }
    }

    mod frames {
        use super::*;

        #[test]
        fn take_frame_drains_queue() {
            let mut s = Scheduler::new();
            s.request_frame("draw");
            assert_eq!(s.take_frame(), vec!["draw"]);
            assert!(s.take_frame().is_empty());
        }

        #[test]
        fn cancelled_frame_is_skipped() {
            let mut s = Scheduler::new();
            let h = s.request_frame("draw");
            assert!(s.is_pending(h));
            assert!(s.cancel(h));
            assert!(s.take_frame().is_empty());
        }
    }
}
