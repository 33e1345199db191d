// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use loading_dispatch::config::DispatchConfigReader;
use loading_dispatch::engine::DisplayIdFormat;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

type HookFn = Box<dyn FnOnce() + Send>;

/// 读取配置时触发一次的钩子（模拟两次存储访问之间的并发修改）
#[derive(Clone, Default)]
pub struct ReadHook(Arc<Mutex<Option<HookFn>>>);

impl ReadHook {
    pub fn arm<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.0.lock().unwrap() = Some(Box::new(hook));
    }

    fn fire(&self) {
        let hook = self.0.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl fmt::Debug for ReadHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let armed = self.0.lock().map(|h| h.is_some()).unwrap_or(false);
        f.debug_struct("ReadHook").field("armed", &armed).finish()
    }
}

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub display_id_format: DisplayIdFormat,
    pub departure_time_format: String,
    pub queue_require_origin_branch: bool,
    pub default_locale: String,
    /// 为 true 时所有读取返回错误
    pub broken: bool,
    pub on_display_id_format: ReadHook,
    pub on_departure_time_format: ReadHook,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            display_id_format: DisplayIdFormat::default(),
            departure_time_format: "%Y-%m-%dT%H:%M".to_string(),
            queue_require_origin_branch: true,
            default_locale: "zh-CN".to_string(),
            broken: false,
            on_display_id_format: ReadHook::default(),
            on_departure_time_format: ReadHook::default(),
        }
    }
}

impl MockConfig {
    /// 单号后缀固定（便于构造单号冲突）
    pub fn fixed_suffix(suffix: u32) -> Self {
        let mut config = Self::default();
        config.display_id_format.suffix_min = suffix;
        config.display_id_format.suffix_max = suffix;
        config
    }

    pub fn any_queue_branch() -> Self {
        let mut config = Self::default();
        config.queue_require_origin_branch = false;
        config
    }

    pub fn broken() -> Self {
        let mut config = Self::default();
        config.broken = true;
        config
    }

    fn check(&self) -> Result<(), Box<dyn Error>> {
        if self.broken {
            return Err("mock config unavailable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl DispatchConfigReader for MockConfig {
    async fn get_display_id_format(&self) -> Result<DisplayIdFormat, Box<dyn Error>> {
        self.on_display_id_format.fire();
        self.check()?;
        Ok(self.display_id_format.clone())
    }

    async fn get_departure_time_format(&self) -> Result<String, Box<dyn Error>> {
        self.on_departure_time_format.fire();
        self.check()?;
        Ok(self.departure_time_format.clone())
    }

    async fn get_queue_require_origin_branch(&self) -> Result<bool, Box<dyn Error>> {
        self.check()?;
        Ok(self.queue_require_origin_branch)
    }

    async fn get_default_locale(&self) -> Result<String, Box<dyn Error>> {
        self.check()?;
        Ok(self.default_locale.clone())
    }

    async fn get_log_filter(&self) -> Result<String, Box<dyn Error>> {
        self.check()?;
        Ok("debug".to_string())
    }
}
