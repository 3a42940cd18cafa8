//! Tracking of spawned external commands.

use crate::error::{Result, ShellError};
use log::{debug, info};
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::fmt;

/// A spawned external process and its last observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub pid: u32,
    pub command: String,
    pub running: bool,
}

impl Job {
    fn status(&self) -> &'static str {
        if self.running { "Running" } else { "Done" }
    }
}

/// Reported by [`JobTable::poll`] for each job seen to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// 1-based job number.
    pub index: usize,
    pub command: String,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Done: {}", self.index, self.command)
    }
}

/// Fixed-capacity list of jobs in spawn order.
///
/// Slots are never reused: once `capacity` jobs have been added, further adds
/// fail even if every tracked job has finished.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
    capacity: usize,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Vec::new(),
            capacity,
        }
    }

    /// Start tracking `pid`. Returns the 1-based job number.
    pub fn add(&mut self, pid: u32, command: &str) -> Result<usize> {
        if self.jobs.len() >= self.capacity {
            return Err(ShellError::CapacityExceeded {
                what: "job table",
                capacity: self.capacity,
            });
        }
        self.jobs.push(Job {
            pid,
            command: command.to_string(),
            running: true,
        });
        debug!("job [{}] pid {pid}: {command}", self.jobs.len());
        Ok(self.jobs.len())
    }

    /// Check every running job without blocking.
    ///
    /// Jobs whose process has exited are marked done and returned in insertion
    /// order. A pid that is no longer our child is treated as finished too, since
    /// nothing will ever report on it again.
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        for (i, job) in self.jobs.iter_mut().enumerate() {
            if !job.running || !has_exited(job.pid) {
                continue;
            }
            job.running = false;
            info!("job [{}] finished: {}", i + 1, job.command);
            done.push(Completion {
                index: i + 1,
                command: job.command.clone(),
            });
        }
        done
    }

    /// Look up a job by its 1-based number.
    pub fn get(&self, index: usize) -> Option<&Job> {
        index.checked_sub(1).and_then(|i| self.jobs.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Number of jobs still marked running.
    pub fn running(&self) -> usize {
        self.jobs.iter().filter(|j| j.running).count()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// One `[n] Running|Done: command` line per job.
    pub fn write_listing(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for (i, job) in self.jobs.iter().enumerate() {
            writeln!(out, "[{}] {}: {}", i + 1, job.status(), job.command)?;
        }
        Ok(())
    }
}

fn has_exited(pid: u32) -> bool {
    // Zero or out-of-range pids would make waitpid reap unrelated children.
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return true,
    };
    match waitpid(Pid::from_raw(raw), Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => false,
        Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => true,
        Ok(_) => false,
        Err(Errno::ECHILD) => true,
        Err(e) => {
            debug!("waitpid({pid}) failed: {e}");
            false
        }
    }
}
