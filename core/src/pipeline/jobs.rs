use crate::pipeline::spawn::try_wait_pid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub cmdline: String,
    /// Stages that have not been reaped yet.
    pids: Vec<libc::pid_t>,
    last_status: i32,
}

/// A background job whose every stage has exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedJob {
    pub id: usize,
    pub cmdline: String,
    pub status: i32,
}

/// Background pipelines still owned by the session. Polled with
/// `waitpid(WNOHANG)` so finished jobs do not linger as zombies.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a launched background pipeline and returns its job number.
    pub fn add(&mut self, pids: Vec<libc::pid_t>, cmdline: &str) -> usize {
        // Numbers are reused once the table drains, like other shells do.
        let id = self.jobs.iter().map(|job| job.id).max().unwrap_or(0) + 1;
        self.jobs.push(Job {
            id,
            cmdline: cmdline.trim().to_string(),
            pids,
            last_status: 0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Collects exited stages without blocking and removes jobs whose stages
    /// have all finished.
    pub fn reap(&mut self) -> Vec<FinishedJob> {
        for job in &mut self.jobs {
            let last_pid = job.pids.last().copied();
            job.pids.retain(|&pid| match try_wait_pid(pid) {
                Some(status) => {
                    if Some(pid) == last_pid {
                        job.last_status = status;
                    }
                    false
                }
                None => true,
            });
        }

        let mut finished = Vec::new();
        self.jobs.retain(|job| {
            if job.pids.is_empty() {
                finished.push(FinishedJob {
                    id: job.id,
                    cmdline: job.cmdline.clone(),
                    status: job.last_status,
                });
                false
            } else {
                true
            }
        });
        finished
    }
}
