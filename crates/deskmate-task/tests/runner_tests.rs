use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use deskmate_core::config::ShutdownPolicy;
use deskmate_core::traits::Generator;
use deskmate_core::types::{Slot, TaskId, TaskStatus};
use deskmate_core::Error;
use deskmate_task::{TaskRunner, WorkerTask};

const LIVENESS: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
#[error("ConnectionError: {0}")]
struct ConnectionError(String);

enum Reply {
    Text(&'static str),
    Fail(&'static str),
}

struct MockGenerator {
    reply: Reply,
}

impl Generator for MockGenerator {
    fn complete(&self, _system: &str, _user: &str, _model: &str) -> anyhow::Result<String> {
        match self.reply {
            Reply::Text(t) => Ok(t.to_string()),
            Reply::Fail(msg) => Err(ConnectionError(msg.to_string()).into()),
        }
    }
    fn generate_image(&self, _: &str, _: &str, _: usize) -> anyhow::Result<Vec<String>> {
        Ok(vec![])
    }
    fn fetch_image(&self, _url: &str) -> anyhow::Result<Vec<u8>> {
        Ok(vec![])
    }
    fn transcribe_audio(&self, _audio: Vec<u8>, _file_name: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

type Log = Rc<RefCell<Vec<Result<String, String>>>>;

fn submit_logged<I: Send + 'static>(
    runner: &mut TaskRunner,
    task: WorkerTask<I, String>,
    log: &Log,
) -> deskmate_core::Result<TaskId> {
    let ok_log = Rc::clone(log);
    let err_log = Rc::clone(log);
    runner.submit(
        task,
        move |v| ok_log.borrow_mut().push(Ok(v)),
        move |e| err_log.borrow_mut().push(Err(e)),
    )
}

fn translate_task(client: Arc<dyn Generator>, text: &str) -> WorkerTask<String, String> {
    WorkerTask::new(Slot::named("translate"), text.to_string(), move |text: String| {
        client.complete("Translate English to Korean.", &text, "gpt-3.5-turbo")
    })
}

#[test]
fn translate_success_reaches_success_callback() {
    let client: Arc<dyn Generator> = Arc::new(MockGenerator {
        reply: Reply::Text("안녕"),
    });
    let mut runner = TaskRunner::new();
    let log: Log = Rc::default();

    submit_logged(&mut runner, translate_task(client, "Translate: Hello"), &log).expect("submit");
    assert!(runner.run_until_idle(LIVENESS), "task resolves");

    assert_eq!(*log.borrow(), vec![Ok("안녕".to_string())]);
    assert!(!runner.is_busy(&Slot::named("translate")), "slot freed after completion");
}

#[test]
fn connection_error_reaches_failure_callback() {
    let client: Arc<dyn Generator> = Arc::new(MockGenerator {
        reply: Reply::Fail("timeout"),
    });
    let mut runner = TaskRunner::new();
    let log: Log = Rc::default();

    submit_logged(&mut runner, translate_task(client, "Hello"), &log).expect("submit");
    assert!(runner.run_until_idle(LIVENESS));

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    let message = log[0].as_ref().expect_err("failure");
    assert!(message.contains("timeout"), "message was {message:?}");
}

#[test]
fn busy_slot_rejects_second_submission() {
    let mut runner = TaskRunner::new();
    let started = Arc::new(AtomicUsize::new(0));
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let slot = Slot::named("filesearch");

    let counter = Arc::clone(&started);
    let first = WorkerTask::new(slot.clone(), gate_rx, move |gate: mpsc::Receiver<()>| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = gate.recv();
        Ok("first".to_string())
    });
    let first_id = runner.submit(first, |_| {}, |_| {}).expect("first submit");
    assert_eq!(runner.status(&slot), Some((first_id, TaskStatus::Pending)));

    let counter = Arc::clone(&started);
    let second = WorkerTask::new(slot.clone(), (), move |()| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok("second".to_string())
    });
    let err = runner.submit(second, |_| {}, |_| {}).expect_err("slot is busy");
    assert!(matches!(err, Error::Busy { ref slot } if slot.as_str() == "filesearch"));
    assert_eq!(runner.in_flight(), 1);

    gate_tx.send(()).expect("release gate");
    assert!(runner.run_until_idle(LIVENESS));
    assert_eq!(started.load(Ordering::SeqCst), 1, "the rejected task never ran");

    let again = WorkerTask::new(slot, (), |()| Ok("third".to_string()));
    runner.submit(again, |_| {}, |_| {}).expect("slot available again");
    assert!(runner.run_until_idle(LIVENESS));
}

#[test]
fn every_task_resolves_exactly_once() {
    let mut runner = TaskRunner::new();
    let calls: Rc<RefCell<HashMap<String, usize>>> = Rc::default();

    for i in 0..8 {
        let name = format!("slot-{i}");
        let task = WorkerTask::new(Slot::new(name.clone()), i, |i: usize| {
            if i % 2 == 0 {
                Ok(i)
            } else {
                Err(anyhow::anyhow!("odd input {i}"))
            }
        });
        let ok_calls = Rc::clone(&calls);
        let err_calls = Rc::clone(&calls);
        let ok_name = name.clone();
        runner
            .submit(
                task,
                move |_| *ok_calls.borrow_mut().entry(ok_name).or_default() += 1,
                move |_| *err_calls.borrow_mut().entry(name).or_default() += 1,
            )
            .expect("distinct slots never conflict");
    }

    assert!(runner.run_until_idle(LIVENESS), "all tasks resolve within the timeout");
    assert_eq!(runner.poll(), 0, "nothing is delivered twice");

    let calls = calls.borrow();
    assert_eq!(calls.len(), 8);
    assert!(calls.values().all(|&n| n == 1), "{calls:?}");
}

#[test]
fn panicking_work_becomes_failure() {
    let mut runner = TaskRunner::new();
    let log: Log = Rc::default();
    let work = |_: String| -> anyhow::Result<String> { panic!("no image URL returned") };
    let task = WorkerTask::new(Slot::named("image"), String::new(), work);

    submit_logged(&mut runner, task, &log).expect("submit");
    assert!(runner.run_until_idle(LIVENESS));

    let log = log.borrow();
    let message = log[0].as_ref().expect_err("failure");
    assert!(message.contains("no image URL returned"));
}

#[test]
fn cancelled_task_never_delivers() {
    let mut runner = TaskRunner::new();
    let log: Log = Rc::default();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let slot = Slot::named("rudebot");

    let task = WorkerTask::new(slot.clone(), gate_rx, |gate: mpsc::Receiver<()>| {
        let _ = gate.recv();
        Ok("too late".to_string())
    });
    submit_logged(&mut runner, task, &log).expect("submit");

    assert!(runner.cancel(&slot));
    assert!(!runner.cancel(&slot), "second cancel is a no-op");
    assert!(!runner.is_busy(&slot));

    gate_tx.send(()).expect("release gate");
    assert!(!runner.wait_next(Duration::from_millis(300)), "stale outcome is discarded");
    assert!(log.borrow().is_empty());

    let again = WorkerTask::new(slot, "again".to_string(), Ok);
    submit_logged(&mut runner, again, &log).expect("slot reusable");
    assert!(runner.run_until_idle(LIVENESS));
    assert_eq!(*log.borrow(), vec![Ok("again".to_string())]);
}

#[test]
fn independent_slots_complete_independently() {
    let mut runner = TaskRunner::new();
    let log: Log = Rc::default();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();

    let slow = WorkerTask::new(Slot::named("audio"), gate_rx, |gate: mpsc::Receiver<()>| {
        let _ = gate.recv();
        Ok("slow".to_string())
    });
    let fast = WorkerTask::new(Slot::named("poem"), "fast".to_string(), Ok);
    submit_logged(&mut runner, slow, &log).expect("slow");
    submit_logged(&mut runner, fast, &log).expect("fast");

    assert!(runner.wait_next(LIVENESS));
    assert_eq!(*log.borrow(), vec![Ok("fast".to_string())]);
    assert!(runner.is_busy(&Slot::named("audio")));

    gate_tx.send(()).expect("release gate");
    assert!(runner.run_until_idle(LIVENESS));
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn blocking_shutdown_joins_workers() {
    let mut runner = TaskRunner::with_policy(ShutdownPolicy::Block);
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let task = WorkerTask::new(Slot::named("notes"), (), move |()| {
        std::thread::sleep(Duration::from_millis(100));
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    runner.submit(task, |()| panic!("callbacks never run after shutdown"), |_| {}).expect("submit");

    assert_eq!(runner.shutdown(), 1);
    assert!(finished.load(Ordering::SeqCst), "worker joined before shutdown returned");
}
