// region:    --- Imports
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Clock

/// 만료 판정을 위한 시간 소스
/// 테스트에서 시간을 주입할 수 있도록 트레이트로 분리한다.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 실제 벽시계
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// endregion: --- Clock

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// 테스트용 고정 시계
    pub struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_fixed_clock_is_injectable() {
        let t = Utc::now() + Duration::hours(1);
        let clock = FixedClock(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
    }
}

// endregion: --- Tests
