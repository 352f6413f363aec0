use std::sync::Arc;

use super::duck::{Feed, Food, Quack};

/// 饲养员：喂鸭子并让它叫
///
/// 两种能力都由容器注入；同一作用域内它们指向同一只鸭子。
pub struct DuckFeeder {
    feed: Arc<dyn Feed>,
    duck: Arc<dyn Quack>,
}

impl DuckFeeder {
    pub fn new(feed: Arc<dyn Feed>, duck: Arc<dyn Quack>) -> Self {
        Self { feed, duck }
    }

    pub fn feed(&self, food: Food) {
        self.feed.eat(food);
    }

    pub fn ask(&self) -> String {
        self.duck.quack()
    }

    /// 所喂鸭子目前吃过的食物
    pub fn foods(&self) -> Vec<Food> {
        self.feed.eaten()
    }
}
