//! 示例领域：鸭子、食物与饲养员
//!
//! 作为容器公共契约的使用者，演示作用域实例共享与销毁顺序。

mod duck;
mod feeder;

pub use duck::{Duck, Feed, Food, FoodList, NameCounter, Quack, Transcript};
pub use feeder::DuckFeeder;

use crate::infrastructure::container::{ContainerError, Registry, ServiceContainer};
use std::sync::Arc;

/// 注册示例服务
///
/// - `FoodList`: 瞬态
/// - `Duck`: 作用域，可销毁，名称来自 `names`
/// - `dyn Feed` / `dyn Quack`: 瞬态，均委托给当前作用域的 `Duck`
/// - `DuckFeeder`: 瞬态
pub fn register_duck_services(
    registry: &mut Registry,
    names: NameCounter,
    transcript: Transcript,
) -> Result<(), ContainerError> {
    registry
        .register_transient(|_| Ok(Arc::new(FoodList::default())))?
        .register_scoped_disposable(move |scope| {
            let foods = scope.resolve::<FoodList>()?;
            Ok(Arc::new(Duck::new(names.next(), foods, transcript.clone())))
        })?
        .register_transient::<dyn Feed, _>(|scope| Ok(scope.resolve::<Duck>()? as Arc<dyn Feed>))?
        .register_transient::<dyn Quack, _>(|scope| {
            Ok(scope.resolve::<Duck>()? as Arc<dyn Quack>)
        })?
        .register_transient(|scope| {
            Ok(Arc::new(DuckFeeder::new(
                scope.resolve::<dyn Feed>()?,
                scope.resolve::<dyn Quack>()?,
            )))
        })?;

    Ok(())
}

/// 重放喂鸭子流程
///
/// 根作用域中的饲养员喂牛奶；子作用域中两位饲养员先后喂苹果和香蕉（共享同一只鸭子）；
/// 根作用域饲养员再喂一次牛奶；最后销毁子作用域。
pub fn run_walkthrough(container: &ServiceContainer) -> Result<(), ContainerError> {
    let sasha = container.resolve::<DuckFeeder>()?;
    sasha.feed(Food::Milk);
    sasha.ask();

    container.with_scope(|scope| -> Result<(), ContainerError> {
        let mia = scope.resolve::<DuckFeeder>()?;
        mia.feed(Food::Apple);
        mia.ask();

        let riley = scope.resolve::<DuckFeeder>()?;
        riley.feed(Food::Banana);
        riley.ask();

        sasha.feed(Food::Milk);
        sasha.ask();
        Ok(())
    })??;

    Ok(())
}
