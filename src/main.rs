use clap::Parser;
use log::{debug, error, info};
use rand::Rng;
use std::io;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use syncqueue::{set_log_level, BlockingQueue, BlockingQueueRef, Config, Result};

/// Runs producers and consumers against one shared queue and checks that
/// every item put is taken and finished.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// YAML config file, defaults to ./config.yaml when present
    #[clap(short, long)]
    config: Option<String>,
    /// Queue capacity, zero or less for unbounded
    #[clap(long, allow_hyphen_values = true)]
    capacity: Option<i64>,
    #[clap(short, long)]
    producers: Option<usize>,
    #[clap(short = 'n', long)]
    consumers: Option<usize>,
    /// Items put by each producer
    #[clap(short, long)]
    items: Option<usize>,
    /// Max simulated work per item in microseconds
    #[clap(short, long)]
    work_us: Option<u64>,
    #[clap(short, long)]
    log_level: Option<String>,
}

impl Args {
    fn merge_into(self, config: &mut Config) {
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(producers) = self.producers {
            config.producers = producers;
        }
        if let Some(consumers) = self.consumers {
            config.consumers = consumers;
        }
        if let Some(items) = self.items {
            config.items_per_producer = items;
        }
        if let Some(work_us) = self.work_us {
            config.max_work_us = work_us;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

fn simulate_work(max_work_us: u64) {
    if max_work_us > 0 {
        let us = rand::thread_rng().gen_range(0..=max_work_us);
        thread::sleep(Duration::from_micros(us));
    }
}

fn run(config: &Config) -> Result<usize> {
    let queue: BlockingQueueRef<usize> = Arc::new(BlockingQueue::new(config.capacity));
    let taken = Arc::new(AtomicUsize::new(0));
    let per_producer = config.items_per_producer;

    let finished = Arc::new(AtomicUsize::new(0));
    let producers: Vec<_> = (0..config.producers)
        .map(|id| {
            let queue = queue.clone();
            let finished = finished.clone();
            thread::Builder::new()
                .name(format!("producer-{}", id))
                .spawn(move || {
                    for i in 0..per_producer {
                        queue.push_back(id * per_producer + i);
                    }
                    finished.fetch_add(1, Ordering::SeqCst);
                    debug!("producer {} done", id);
                })
        })
        .collect::<io::Result<_>>()?;

    // Consumers never take more than was produced in total, so none of
    // them can be left blocked once the producers finish.
    let total = config.producers * per_producer;
    let consumers: Vec<_> = (0..config.consumers)
        .map(|id| {
            let queue = queue.clone();
            let taken = taken.clone();
            let max_work_us = config.max_work_us;
            thread::Builder::new()
                .name(format!("consumer-{}", id))
                .spawn(move || {
                    for _ in 0..per_producer {
                        if taken.fetch_add(1, Ordering::SeqCst) >= total {
                            taken.fetch_sub(1, Ordering::SeqCst);
                            break;
                        }
                        queue.pop_front();
                        simulate_work(max_work_us);
                        queue.task_done();
                    }
                    debug!("consumer {} done", id);
                })
        })
        .collect::<io::Result<_>>()?;

    for consumer in consumers {
        if consumer.join().is_err() {
            error!("consumer thread panicked");
        }
    }

    // Whatever the consumers left behind is taken here while producers may
    // still be blocked on a full queue.
    let mut drained = 0;
    loop {
        let all_put = finished.load(Ordering::SeqCst) == config.producers;
        match queue.get(true, Some(chrono::Duration::milliseconds(50))) {
            Ok(_) => {
                queue.task_done();
                drained += 1;
            }
            Err(_) if all_put => break,
            Err(_) => continue,
        }
    }
    for producer in producers {
        if producer.join().is_err() {
            error!("producer thread panicked");
        }
    }
    debug!("main thread drained {} items", drained);
    queue.wait_all_complete();
    Ok(taken.load(Ordering::SeqCst) + drained)
}

fn main() {
    let args = Args::parse();
    let loaded = match args.config {
        Some(ref path) => Config::from_file(path),
        None => Config::from_cwd_config(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config: {}", e);
            process::exit(2);
        }
    };
    args.merge_into(&mut config);
    set_log_level(config.level_filter());
    debug!("config: {:?}", config);

    let start = Instant::now();
    let dequeued = match run(&config) {
        Ok(dequeued) => dequeued,
        Err(e) => {
            error!("run failed: {}", e);
            process::exit(2);
        }
    };
    let enqueued = config.producers * config.items_per_producer;
    info!(
        "enqueued {} dequeued {} in {:.3} s",
        enqueued,
        dequeued,
        start.elapsed().as_secs_f64()
    );
    if enqueued != dequeued {
        error!("item count mismatch");
        process::exit(1);
    }
}
