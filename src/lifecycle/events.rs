use std::time::Duration;
use tokio::sync::broadcast;

/// 코디네이터의 종료 상태마다 발생하는 사용자 알림
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Created {
        id: String,
        temporary_id: String,
    },
    CreateFailed {
        temporary_id: String,
        title: String,
        message: String,
    },
    Structured {
        id: String,
    },
    StructuringFailed {
        id: String,
        message: String,
    },
    DeleteScheduled {
        id: String,
        undo_window: Duration,
    },
    DeleteCancelled {
        id: String,
    },
    Deleted {
        id: String,
        /// 백엔드가 이미 없다고 답했는지 여부
        already_gone: bool,
    },
    DeleteFailed {
        id: String,
        message: String,
    },
    Saved {
        id: String,
        operations: usize,
    },
}

/// broadcast 채널 송신 측. 구독자가 없어도 에러가 아닙니다.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, event: LifecycleEvent) {
        // send()는 수신자가 하나도 없을 때만 실패합니다.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }
}
