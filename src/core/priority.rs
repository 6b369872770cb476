use std::{
    sync::{atomic::{self, AtomicBool}, Arc, Mutex, MutexGuard, Weak},
    thread::{self, JoinHandle},
    time::{Duration, Instant}
};

use fnv::FnvHashMap;

use crate::oracle::ParameterOracle;

use super::Error;

/// How many parameters may hold host priority at once.
pub const PRIORITY_CAPACITY: usize = 8;
/// How often a priority-wanting parameter re-asserts its claim.
pub const PRIORITY_INTERVAL: Duration = Duration::from_secs(5);
/// Shortest tick the driver thread will sleep between polls.
pub const MIN_DRIVER_TICK: Duration = Duration::from_millis(1);

pub type TaskId = u64;

struct TaskState {
    next_due: Instant
}

#[derive(Clone, Copy)]
struct Member {
    task: TaskId,
    index: i32
}

#[derive(Default)]
struct State {
    next_id: TaskId,
    tasks: FnvHashMap<TaskId, TaskState>,
    // insertion order
    members: Vec<Member>
}

/// Owns the bounded priority set and the periodic re-assertion tasks.
///
/// Members are kept in insertion order. When the set is full, a new candidate
/// replaces the first member whose index is strictly greater than its own; if
/// there is none, the candidate is turned away.
#[derive(Default)]
pub struct PriorityScheduler {
    state: Mutex<State>
}

impl PriorityScheduler {
    pub fn new() -> Arc<PriorityScheduler> {
        Arc::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Starts a periodic task, first due one interval after registration.
    pub fn register(self: &Arc<Self>) -> PriorityTask {
        self.register_at(Instant::now())
    }

    pub fn register_at(self: &Arc<Self>, now: Instant) -> PriorityTask {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        state.tasks.insert(id, TaskState { next_due: now + PRIORITY_INTERVAL });

        PriorityTask {
            id,
            scheduler: Arc::downgrade(self)
        }
    }

    /// Records that `task` resolved to `index` and tries to give it a slot.
    /// Returns whether the task holds a slot afterwards.
    pub fn admit(&self, task: TaskId, index: i32) -> bool {
        let mut state = self.state();
        if !state.tasks.contains_key(&task) {
            return false;
        }

        if let Some(member) = state.members.iter_mut().find(|m| m.task == task) {
            member.index = index;
            return true;
        }

        if state.members.len() < PRIORITY_CAPACITY {
            state.members.push(Member { task, index });
            return true;
        }

        let Some(pos) = state.members.iter().position(|m| m.index > index) else {
            debug!("Priority set full, index {} not admitted", index);
            return false;
        };

        let evicted = state.members.remove(pos);
        debug!("Index {} evicted from priority set by index {}", evicted.index, index);
        state.members.push(Member { task, index });
        true
    }

    /// Drops `task` from the priority set right away. Its periodic task keeps running.
    pub fn release(&self, task: TaskId) {
        self.state().members.retain(|m| m.task != task);
    }

    /// Stops the periodic task and releases its slot.
    pub fn cancel(&self, task: TaskId) {
        let mut state = self.state();
        state.tasks.remove(&task);
        state.members.retain(|m| m.task != task);
    }

    pub fn is_member(&self, task: TaskId) -> bool {
        self.state().members.iter().any(|m| m.task == task)
    }

    pub fn is_running(&self, task: TaskId) -> bool {
        self.state().tasks.contains_key(&task)
    }

    /// Indices currently holding priority, in insertion order.
    pub fn member_indices(&self) -> Vec<i32> {
        self.state().members.iter().map(|m| m.index).collect()
    }

    pub fn len(&self) -> usize {
        self.state().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().members.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.state().tasks.len()
    }

    /// Runs every task due at `now`. Returns the number of priority requests sent.
    pub fn poll(&self, now: Instant, oracle: &dyn ParameterOracle) -> usize {
        let mut requests = Vec::new();
        {
            let mut state = self.state();
            let State { tasks, members, .. } = &mut *state;
            for (id, task) in tasks.iter_mut() {
                if task.next_due > now {
                    continue;
                }

                task.next_due += PRIORITY_INTERVAL;
                if task.next_due <= now {
                    task.next_due = now + PRIORITY_INTERVAL;
                }

                if let Some(member) = members.iter().find(|m| m.task == *id) {
                    requests.push(member.index);
                }
            }
        }

        // Host calls happen outside the lock
        for index in &requests {
            oracle.request_priority(*index);
        }
        requests.len()
    }

    /// Polls on a background thread every `tick` until the returned handle is stopped.
    pub fn start_thread(self: &Arc<Self>, oracle: Arc<dyn ParameterOracle>, tick: Duration) -> Result<DriverHandle, Error> {
        let tick = driver_tick(tick);
        let stop = Arc::new(AtomicBool::new(false));
        let scheduler = Arc::downgrade(self);
        let thread_stop = stop.clone();

        let thread = thread::Builder::new()
            .name("paramlib-priority".to_owned())
            .spawn(move || {
                while !thread_stop.load(atomic::Ordering::Acquire) {
                    thread::park_timeout(tick);
                    if thread_stop.load(atomic::Ordering::Acquire) {
                        break;
                    }

                    let Some(scheduler) = scheduler.upgrade() else {
                        break;
                    };
                    scheduler.poll(Instant::now(), oracle.as_ref());
                }
                debug!("Priority driver stopped");
            })
            .map_err(Error::ThreadSpawnError)?;

        Ok(DriverHandle {
            stop,
            thread: Some(thread)
        })
    }
}

pub(crate) fn driver_tick(tick: Duration) -> Duration {
    if tick < MIN_DRIVER_TICK {
        warn!("Priority driver tick of {:?} is too short, using {:?}", tick, MIN_DRIVER_TICK);
        MIN_DRIVER_TICK
    }
    else {
        tick
    }
}

/// Cancellation handle for one periodic priority task. Dropping it stops the task.
pub struct PriorityTask {
    id: TaskId,
    scheduler: Weak<PriorityScheduler>
}

impl PriorityTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(self) {}
}

impl Drop for PriorityTask {
    fn drop(&mut self) {
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.cancel(self.id);
        }
    }
}

pub struct DriverHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>
}

impl DriverHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, atomic::Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                error!("Priority driver thread panicked");
            }
        }
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use crate::oracle::{MemoryOracle, ParamKind};

    use super::*;

    fn fill(scheduler: &Arc<PriorityScheduler>, indices: &[i32]) -> Vec<PriorityTask> {
        indices.iter()
            .map(|&index| {
                let task = scheduler.register();
                assert!(scheduler.admit(task.id(), index));
                task
            })
            .collect()
    }

    #[test]
    fn set_never_exceeds_capacity() {
        let scheduler = PriorityScheduler::new();
        let _tasks = fill(&scheduler, &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(scheduler.len(), PRIORITY_CAPACITY);

        let extra = scheduler.register();
        assert!(!scheduler.admit(extra.id(), 20));
        assert_eq!(scheduler.len(), PRIORITY_CAPACITY);
    }

    #[test]
    fn evicts_first_member_with_greater_index() {
        let scheduler = PriorityScheduler::new();
        let tasks = fill(&scheduler, &[3, 10, 1, 12, 4, 5, 6, 7]);

        let newcomer = scheduler.register();
        assert!(scheduler.admit(newcomer.id(), 2));

        // 3 is the first member greater than 2, not the largest (12)
        assert_eq!(scheduler.member_indices(), vec![10, 1, 12, 4, 5, 6, 7, 2]);
        assert!(!scheduler.is_member(tasks[0].id()));
        assert!(scheduler.is_member(newcomer.id()));
    }

    #[test]
    fn equal_index_does_not_evict() {
        let scheduler = PriorityScheduler::new();
        let _tasks = fill(&scheduler, &[0, 1, 2, 3, 4, 5, 6, 7]);
        let before = scheduler.member_indices();

        let newcomer = scheduler.register();
        assert!(!scheduler.admit(newcomer.id(), 7));
        assert_eq!(scheduler.member_indices(), before);
    }

    #[test]
    fn readmitting_member_updates_index_in_place() {
        let scheduler = PriorityScheduler::new();
        let tasks = fill(&scheduler, &[5, 6]);
        assert!(scheduler.admit(tasks[0].id(), 9));
        assert_eq!(scheduler.member_indices(), vec![9, 6]);
    }

    #[test]
    fn poll_reasserts_members_only() {
        let oracle = MemoryOracle::with_params([("A", ParamKind::Float), ("B", ParamKind::Float)]);
        let scheduler = PriorityScheduler::new();
        let start = Instant::now();

        let member = scheduler.register_at(start);
        let outsider = scheduler.register_at(start);
        scheduler.admit(member.id(), 0);

        assert_eq!(scheduler.poll(start + Duration::from_secs(4), &oracle), 0);
        assert_eq!(scheduler.poll(start + PRIORITY_INTERVAL, &oracle), 1);
        assert_eq!(oracle.priority_requests(), vec![0]);

        // not due again until the next interval
        assert_eq!(scheduler.poll(start + PRIORITY_INTERVAL, &oracle), 0);
        assert!(scheduler.is_running(outsider.id()));
    }

    #[test]
    fn released_task_keeps_polling_as_noop() {
        let oracle = MemoryOracle::with_params([("A", ParamKind::Float)]);
        let scheduler = PriorityScheduler::new();
        let start = Instant::now();

        let task = scheduler.register_at(start);
        scheduler.admit(task.id(), 0);
        scheduler.release(task.id());

        assert!(scheduler.is_running(task.id()));
        assert_eq!(scheduler.poll(start + PRIORITY_INTERVAL, &oracle), 0);
        assert!(oracle.priority_requests().is_empty());
    }

    #[test]
    fn dropping_task_cancels_it() {
        let scheduler = PriorityScheduler::new();
        let task = scheduler.register();
        let id = task.id();
        scheduler.admit(id, 3);

        drop(task);
        assert!(!scheduler.is_running(id));
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn cancelled_task_cannot_be_admitted() {
        let scheduler = PriorityScheduler::new();
        let task = scheduler.register();
        let id = task.id();
        task.cancel();
        assert!(!scheduler.admit(id, 0));
    }

    fn wait_for_requests(oracle: &MemoryOracle) -> bool {
        for _ in 0..500 {
            if !oracle.priority_requests().is_empty() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn driver_thread_polls_until_stopped() {
        let oracle = Arc::new(MemoryOracle::with_params([("A", ParamKind::Float), ("B", ParamKind::Float)]));
        let scheduler = PriorityScheduler::new();

        let task = scheduler.register_at(Instant::now() - PRIORITY_INTERVAL);
        assert!(scheduler.admit(task.id(), 1));

        let driver = scheduler.start_thread(oracle.clone(), Duration::from_millis(5)).unwrap();
        assert!(wait_for_requests(&oracle));
        driver.stop();

        let requests = oracle.priority_requests();
        assert_eq!(requests, vec![1]);

        // a task due again after stop must not be picked up
        let late = scheduler.register_at(Instant::now() - PRIORITY_INTERVAL);
        assert!(scheduler.admit(late.id(), 0));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(oracle.priority_requests(), requests);
    }

    #[test]
    fn driver_tick_has_a_floor() {
        assert_eq!(driver_tick(Duration::ZERO), MIN_DRIVER_TICK);
        assert_eq!(driver_tick(Duration::from_millis(20)), Duration::from_millis(20));
    }

    #[test]
    fn driver_thread_stops_with_zero_tick() {
        let oracle: Arc<dyn ParameterOracle> = Arc::new(MemoryOracle::default());
        let scheduler = PriorityScheduler::new();
        let driver = scheduler.start_thread(oracle, Duration::ZERO).unwrap();
        driver.stop();
    }
}
