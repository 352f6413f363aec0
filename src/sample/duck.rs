use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::infrastructure::container::{BoxError, Dispose};

/// 鸭子的食物
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Food {
    Milk,
    Apple,
    Banana,
}

impl fmt::Display for Food {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Food::Milk => "Milk",
            Food::Apple => "Apple",
            Food::Banana => "Banana",
        };
        f.write_str(name)
    }
}

/// 能力：进食
pub trait Feed: Send + Sync {
    fn eat(&self, food: Food);

    /// 目前吃过的全部食物，按先后顺序
    fn eaten(&self) -> Vec<Food>;
}

/// 能力：报出自己的名字和食物
pub trait Quack: Send + Sync {
    fn quack(&self) -> String;
}

/// 鸭子编号计数器
///
/// 由宿主持有并移入鸭子工厂，测试可以指定起始编号。
#[derive(Debug, Clone)]
pub struct NameCounter(Arc<AtomicU32>);

impl Default for NameCounter {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl NameCounter {
    pub fn starting_at(first: u32) -> Self {
        Self(Arc::new(AtomicU32::new(first)))
    }

    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// 鸭子输出内容的共享记录
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    pub fn record(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(target: "lifetime_di::sample", "{}", line);
        self.0.lock().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// 注入每只鸭子的食物列表（瞬态注册）
#[derive(Debug, Default)]
pub struct FoodList {
    items: Mutex<Vec<Food>>,
}

impl FoodList {
    pub fn push(&self, food: Food) {
        self.items.lock().push(food);
    }

    pub fn snapshot(&self) -> Vec<Food> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

/// 鸭子：能吃、能叫，只会被销毁一次
pub struct Duck {
    name: String,
    foods: Arc<FoodList>,
    transcript: Transcript,
    disposed: AtomicBool,
    teardowns: AtomicU32,
}

impl Duck {
    pub fn new(number: u32, foods: Arc<FoodList>, transcript: Transcript) -> Self {
        Self {
            name: format!("Duck {}.", number),
            foods,
            transcript,
            disposed: AtomicBool::new(false),
            teardowns: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn foods(&self) -> &FoodList {
        &self.foods
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// 实际执行销毁的次数（0 或 1）
    pub fn teardown_count(&self) -> u32 {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl Feed for Duck {
    fn eat(&self, food: Food) {
        self.foods.push(food);
    }

    fn eaten(&self) -> Vec<Food> {
        self.foods.snapshot()
    }
}

impl Quack for Duck {
    fn quack(&self) -> String {
        let eaten = self
            .foods
            .snapshot()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let line = format!("#{} {}", self.name, eaten);
        self.transcript.record(line.clone());
        line
    }
}

impl Dispose for Duck {
    fn dispose(&self) -> Result<(), BoxError> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.teardowns.fetch_add(1, Ordering::SeqCst);
        self.transcript
            .record(format!("Disposed:#{} Count: {}", self.name, self.foods.len()));
        self.foods.clear();
        Ok(())
    }
}

impl fmt::Debug for Duck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duck")
            .field("name", &self.name)
            .field("foods", &self.foods.snapshot())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
