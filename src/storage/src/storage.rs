// Copyright 2024 The Loquat Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Multi-instance facade. Owns the RocksDB instances, routes keys to them
//! and runs the background task worker.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use kstd::lock_mgr::LockMgr;
use log::{error, info, warn};
use snafu::ensure;
use tokio::sync::mpsc;

use crate::{
    base_value_format::DataType,
    error::{ChannelSnafu, CorruptionSnafu, Result},
    options::StorageOptions,
    redis::Redis,
    slot_indexer::SlotIndexer,
    types::KeyInfo,
};

#[derive(Debug, Clone)]
pub enum BgTask {
    CompactRange {
        data_type: DataType,
        start: Vec<u8>,
        end: Vec<u8>,
    },
    Shutdown,
}

pub struct BgTaskHandler {
    sender: mpsc::Sender<BgTask>,
}

impl BgTaskHandler {
    pub fn new() -> (Self, mpsc::Receiver<BgTask>) {
        let (sender, receiver) = mpsc::channel(1000);
        (Self { sender }, receiver)
    }

    pub async fn send(&self, task: BgTask) -> Result<()> {
        self.sender.send(task).await.map_err(|e| {
            ChannelSnafu {
                message: e.to_string(),
            }
            .build()
        })
    }

    /// Non-blocking send used from the operation paths; the caller treats
    /// a full or closed channel as a dropped hint.
    pub fn try_send(&self, task: BgTask) -> Result<()> {
        self.sender.try_send(task).map_err(|e| {
            ChannelSnafu {
                message: e.to_string(),
            }
            .build()
        })
    }
}

pub struct Storage {
    pub insts: Vec<Arc<Redis>>,
    pub lock_mgr: Arc<LockMgr>,
    slot_indexer: Arc<SlotIndexer>,

    bg_task_handler: Arc<BgTaskHandler>,
    bg_task_receiver: Option<mpsc::Receiver<BgTask>>,
    bg_task: Option<tokio::task::JoinHandle<()>>,

    db_instance_num: usize,
    db_id: usize,
    is_opened: AtomicBool,
}

impl Storage {
    pub fn new(db_instance_num: usize, db_id: usize) -> Self {
        let (bg_task_handler, receiver) = BgTaskHandler::new();
        Self {
            insts: Vec::with_capacity(db_instance_num),
            lock_mgr: Arc::new(LockMgr::new(1000)),
            slot_indexer: Arc::new(SlotIndexer::new(db_instance_num)),
            bg_task_handler: Arc::new(bg_task_handler),
            bg_task_receiver: Some(receiver),
            bg_task: None,
            db_instance_num,
            db_id,
            is_opened: AtomicBool::new(false),
        }
    }

    pub fn open(&mut self, options: Arc<StorageOptions>, db_path: impl AsRef<Path>) -> Result<()> {
        let db_path = db_path.as_ref();
        let mut new_insts = Vec::with_capacity(self.db_instance_num);

        for i in 0..self.db_instance_num {
            let sub_path = db_path.join(i.to_string());
            let sub_path_str = sub_path.to_str().ok_or_else(|| {
                CorruptionSnafu {
                    message: format!("invalid db path: {sub_path:?}"),
                }
                .build()
            })?;

            let mut inst = Redis::new(
                options.clone(),
                i as i32,
                self.bg_task_handler.clone(),
                self.lock_mgr.clone(),
            );
            if let Err(e) = inst.open(sub_path_str) {
                error!("open RocksDB instance {i} failed: {e:?}");
                self.is_opened.store(false, Ordering::SeqCst);
                return Err(e);
            }
            new_insts.push(Arc::new(inst));
        }

        self.db_id = options.db_id;
        self.insts = new_insts;

        if let Some(receiver) = self.bg_task_receiver.take() {
            self.bg_task = Some(tokio::spawn(Self::bg_task_worker(
                receiver,
                self.insts.clone(),
                self.slot_indexer.clone(),
            )));
        }

        self.is_opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        let _ = self.bg_task_handler.send(BgTask::Shutdown).await;
        if let Some(handle) = self.bg_task.take() {
            let _ = handle.await;
        }
    }

    async fn bg_task_worker(
        mut receiver: mpsc::Receiver<BgTask>,
        insts: Vec<Arc<Redis>>,
        slot_indexer: Arc<SlotIndexer>,
    ) {
        while let Some(task) = receiver.recv().await {
            match task {
                BgTask::CompactRange {
                    data_type: _,
                    start,
                    end: _,
                } => {
                    let inst = insts[slot_indexer.get_instance(&start)].clone();
                    let result =
                        tokio::task::spawn_blocking(move || inst.compact_key_range(&start)).await;
                    match result {
                        Ok(Err(e)) => warn!("compact-range hint failed: {e}"),
                        Err(e) => warn!("compact-range task panicked: {e}"),
                        Ok(Ok(())) => {}
                    }
                }
                BgTask::Shutdown => {
                    info!("background task worker shutting down");
                    break;
                }
            }
        }
    }

    pub fn db_id(&self) -> usize {
        self.db_id
    }

    pub fn is_opened(&self) -> bool {
        self.is_opened.load(Ordering::SeqCst)
    }

    fn get_db_instance(&self, key: &[u8]) -> &Arc<Redis> {
        &self.insts[self.slot_indexer.get_instance(key)]
    }

    // set commands, routed by key. Multi-key reads are served by the first
    // key's instance; store variants by the destination's instance.

    pub fn sadd(&self, key: &[u8], members: &[&[u8]]) -> Result<i32> {
        self.get_db_instance(key).sadd(key, members)
    }

    pub fn scard(&self, key: &[u8]) -> Result<i32> {
        self.get_db_instance(key).scard(key)
    }

    pub fn sdiff(&self, keys: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SDiff invalid parameter, no keys",
            }
        );
        self.get_db_instance(keys[0]).sdiff(keys)
    }

    pub fn sdiffstore(&self, destination: &[u8], keys: &[&[u8]]) -> Result<i32> {
        self.get_db_instance(destination).sdiffstore(destination, keys)
    }

    pub fn sinter(&self, keys: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SInter invalid parameter, no keys",
            }
        );
        self.get_db_instance(keys[0]).sinter(keys)
    }

    pub fn sinterstore(&self, destination: &[u8], keys: &[&[u8]]) -> Result<i32> {
        self.get_db_instance(destination)
            .sinterstore(destination, keys)
    }

    pub fn sismember(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.get_db_instance(key).sismember(key, member)
    }

    pub fn smembers(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.get_db_instance(key).smembers(key)
    }

    pub fn smembers_with_ttl(&self, key: &[u8]) -> Result<(Vec<Vec<u8>>, i64)> {
        self.get_db_instance(key).smembers_with_ttl(key)
    }

    pub fn smove(&self, source: &[u8], destination: &[u8], member: &[u8]) -> Result<bool> {
        self.get_db_instance(source)
            .smove(source, destination, member)
    }

    pub fn spop(&self, key: &[u8], count: i64) -> Result<Vec<Vec<u8>>> {
        self.get_db_instance(key).spop(key, count)
    }

    pub fn srandmember(&self, key: &[u8], count: i32) -> Result<Vec<Vec<u8>>> {
        self.get_db_instance(key).srandmember(key, count)
    }

    pub fn srem(&self, key: &[u8], members: &[&[u8]]) -> Result<i32> {
        self.get_db_instance(key).srem(key, members)
    }

    pub fn sets_expire(&self, key: &[u8], ttl: i64) -> Result<bool> {
        self.get_db_instance(key).sets_expire(key, ttl)
    }

    pub fn sunion(&self, keys: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SUnion invalid parameter, no keys",
            }
        );
        self.get_db_instance(keys[0]).sunion(keys)
    }

    pub fn sunionstore(&self, destination: &[u8], keys: &[&[u8]]) -> Result<i32> {
        self.get_db_instance(destination)
            .sunionstore(destination, keys)
    }

    pub fn sscan(
        &self,
        key: &[u8],
        cursor: i64,
        pattern: &[u8],
        count: i64,
    ) -> Result<(i64, Vec<Vec<u8>>)> {
        self.get_db_instance(key).sscan(key, cursor, pattern, count)
    }

    /// Moves a set between the instances its old and new key hash to.
    pub fn sets_rename(&self, key: &[u8], newkey: &[u8]) -> Result<()> {
        let inst = self.get_db_instance(key);
        let new_inst = self.get_db_instance(newkey);
        inst.sets_rename(key, new_inst, newkey)
    }

    pub fn sets_renamenx(&self, key: &[u8], newkey: &[u8]) -> Result<()> {
        let inst = self.get_db_instance(key);
        let new_inst = self.get_db_instance(newkey);
        inst.sets_renamenx(key, new_inst, newkey)
    }

    pub fn scan_sets_key_num(&self) -> Result<KeyInfo> {
        let mut key_info = KeyInfo::default();
        for inst in &self.insts {
            key_info = key_info.add(&inst.scan_sets_key_num()?);
        }
        Ok(key_info)
    }
}
