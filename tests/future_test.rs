#[cfg(test)]
mod tests {
    use future_out::{
        spawn, spawn_on, try_spawn, AwaitError, Failure, Future, Inline, PoolConfig, Producer,
        Promise, ThreadPool,
    };
    use futures::executor::block_on;
    use std::hint::black_box;
    use std::sync::{mpsc::channel, Arc};
    use std::{thread, time::Duration};

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum ArithmeticError {
        #[error("division by zero")]
        DivisionByZero,
    }

    fn divide(a: i32, b: i32) -> Result<i32, ArithmeticError> {
        a.checked_div(b).ok_or(ArithmeticError::DivisionByZero)
    }

    #[test]
    fn test_map_completes_within_10ms() {
        let pool: Arc<dyn future_out::Executor> =
            Arc::new(ThreadPool::new(PoolConfig::default().threads(2)).unwrap());
        // Workers are parked and idle before the clock starts.
        spawn_on(pool.clone(), || ()).await_timeout(WAIT).unwrap();

        let doubled = spawn_on(pool, || 1).map(|n| n * 2);
        assert!(doubled.is_completed_within(Duration::from_millis(10)));
        assert_eq!(doubled.await_timeout(Duration::from_millis(10)).unwrap(), 2);
    }

    #[test]
    fn test_division_by_zero_recovers_to_zero() {
        let failed = spawn(|| 2 / black_box(0));
        match failed.await_timeout(WAIT) {
            Err(AwaitError::Failed(failure)) => {
                assert!(failure.is_panic());
                assert!(failure.to_string().contains("divide by zero"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let recovered = failed.recover(|_| Some(0));
        assert_eq!(recovered.await_timeout(WAIT).unwrap(), 0);
    }

    #[test]
    fn test_arithmetic_error_as_value() {
        let failed = try_spawn(|| divide(2, 0));
        let recovered = failed.recover(|failure| {
            match failure.downcast_ref::<ArithmeticError>() {
                Some(ArithmeticError::DivisionByZero) => Some(0),
                None => None,
            }
        });
        assert_eq!(recovered.await_timeout(WAIT).unwrap(), 0);
        assert_eq!(try_spawn(|| divide(8, 2)).await_timeout(WAIT).unwrap(), 4);
    }

    #[test]
    fn test_sequential_binding_multiplies() {
        let two = spawn(|| 2);
        let four = spawn(|| 4);
        let product = two.flat_map(move |a| four.map(move |b| a * b));
        assert_eq!(product.await_timeout(WAIT).unwrap(), 8);
    }

    #[test]
    fn test_flat_map_composition_is_associative() {
        let f1 = || spawn(|| 3);
        let f2 = || spawn(|| 7);
        let left = f1().flat_map(move |a| f2().map(move |b| a * b));
        let right = f2().flat_map(move |b| f1().map(move |a| a * b));
        assert_eq!(left.await_timeout(WAIT).unwrap(), 21);
        assert_eq!(right.await_timeout(WAIT).unwrap(), 21);
    }

    #[test]
    fn test_and_then_discards_side_effect_results() {
        let n = spawn(|| 5)
            .and_then(|n| {
                let _ = n.as_ref().map(|n| n * 2);
            })
            .and_then(|n| {
                let _ = n.as_ref().map(|n| n * 2);
            })
            .and_then(|n| {
                let _ = n.as_ref().map(|n| n * 2);
            });
        assert_eq!(n.await_timeout(WAIT).unwrap(), 5);
    }

    #[test]
    fn test_await_within_window_does_not_time_out() {
        let future = Future::spawn_on(Arc::new(Inline), || "ready");
        assert_eq!(future.await_timeout(Duration::from_millis(10)).unwrap(), "ready");
    }

    #[test]
    fn test_await_reraises_original_failure() {
        let future: Future<()> = try_spawn(|| Err(ArithmeticError::DivisionByZero));
        match future.await_timeout(WAIT) {
            Err(AwaitError::Failed(failure)) => assert_eq!(
                failure.downcast_ref::<ArithmeticError>(),
                Some(&ArithmeticError::DivisionByZero)
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_on_complete_receives_failure_as_value() {
        let (tx, rx) = channel();
        spawn(|| -> u8 { panic!("lost") }).on_complete(move |outcome| tx.send(outcome).unwrap());
        let outcome = rx.recv_timeout(WAIT).unwrap();
        assert!(matches!(outcome, Err(Failure::Panic(_))));
    }

    #[test]
    fn test_many_holders_see_one_completion() {
        let (promise, future) = Producer::<u64>::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let future = future.clone();
                thread::spawn(move || block_on(async { future.await }))
            })
            .collect();
        promise.resolve(99);
        for waiter in waiters {
            let outcome = waiter.join().expect("The waiter thread has panicked");
            assert_eq!(outcome.unwrap(), 99);
        }
    }

    #[test]
    fn test_std_future_inside_async_block() {
        let outcome = block_on(async {
            let a = spawn(|| 6).await?;
            let b = spawn(move || a * 7).await?;
            Ok::<_, Failure>(b)
        });
        assert_eq!(outcome.unwrap(), 42);
    }

    #[test]
    fn test_dropped_producer_fails_future() {
        let (promise, future) = Producer::<String>::new();
        thread::spawn(move || drop(promise))
            .join()
            .expect("The producer thread has panicked");
        assert!(matches!(
            future.await_timeout(WAIT),
            Err(AwaitError::Failed(Failure::ProducerDropped))
        ));
    }
}
