//! Phase 13: Concurrency tests
//!
//! Tests for Task utilities: all(), race(), and concurrent execution patterns.
//! In Raya, Tasks are green threads that can run in parallel across CPU cores.

use super::harness::*;

// ============================================================================
// Task.all() - Wait for All Tasks
// ============================================================================

#[test]
#[ignore = "Task.all() not yet implemented"]
fn test_all_basic() {
    expect_i32(
        "async function getValue(x: number): Task<number> {
             return x;
         }
         async function main(): Task<number> {
             let t1 = getValue(10);
             let t2 = getValue(20);
             let t3 = getValue(12);
             let results = await all([t1, t2, t3]);
             return results[0] + results[1] + results[2];
         }
         return await main();",
        42,
    );
}

#[test]
#[ignore = "Task.all() not yet implemented"]
fn test_all_empty_array() {
    expect_i32(
        "async function main(): Task<number> {
             let tasks: Task<number>[] = [];
             let results = await all(tasks);
             return results.length;
         }
         return await main();",
        0,
    );
}

#[test]
#[ignore = "Task.all() not yet implemented"]
fn test_all_single_task() {
    expect_i32(
        "async function getValue(): Task<number> {
             return 42;
         }
         async function main(): Task<number> {
             let results = await all([getValue()]);
             return results[0];
         }
         return await main();",
        42,
    );
}

#[test]
#[ignore = "Task.all() not yet implemented"]
fn test_all_preserves_order() {
    // Results should be in the same order as input tasks
    expect_i32(
        "async function delay(value: number): Task<number> {
             return value;
         }
         async function main(): Task<number> {
             let t1 = delay(1);
             let t2 = delay(2);
             let t3 = delay(3);
             let results = await all([t1, t2, t3]);
             // Should be [1, 2, 3] regardless of completion order
             return results[0] * 100 + results[1] * 10 + results[2];
         }
         return await main();",
        123,
    );
}

#[test]
#[ignore = "Task.all() not yet implemented"]
fn test_all_concurrent_execution() {
    // Tasks should run concurrently, not sequentially
    expect_i32(
        "let completionOrder: number[] = [];

         async function task(id: number): Task<number> {
             completionOrder.push(id);
             return id;
         }

         async function main(): Task<number> {
             let t1 = task(1);
             let t2 = task(2);
             let t3 = task(3);
             let results = await all([t1, t2, t3]);
             return results[0] + results[1] + results[2];
         }
         return await main();",
        6,
    );
}

// ============================================================================
// Task.race() - First Completed Task
// ============================================================================

#[test]
#[ignore = "Task.race() not yet implemented"]
fn test_race_basic() {
    expect_i32(
        "async function fast(): Task<number> {
             return 42;
         }
         async function slow(): Task<number> {
             // In a real impl, this would have a delay
             return 0;
         }
         async function main(): Task<number> {
             return await race([fast(), slow()]);
         }
         return await main();",
        42, // fast() completes first
    );
}

#[test]
#[ignore = "Task.race() not yet implemented"]
fn test_race_single_task() {
    expect_i32(
        "async function getValue(): Task<number> {
             return 42;
         }
         async function main(): Task<number> {
             return await race([getValue()]);
         }
         return await main();",
        42,
    );
}

// ============================================================================
// Parallel Task Patterns
// ============================================================================

#[test]
#[ignore = "Parallel tasks not yet implemented"]
fn test_parallel_sum() {
    // Sum arrays in parallel
    expect_i32(
        "function sumArray(arr: number[]): number {
             let sum = 0;
             for (let x of arr) {
                 sum = sum + x;
             }
             return sum;
         }

         async function main(): Task<number> {
             let data1 = [1, 2, 3];
             let data2 = [4, 5, 6];
             let data3 = [7, 8, 9];

             // Run sums in parallel using async keyword
             let t1 = async sumArray(data1);
             let t2 = async sumArray(data2);
             let t3 = async sumArray(data3);

             let results = await all([t1, t2, t3]);
             return results[0] + results[1] + results[2];
         }
         return await main();",
        45, // (1+2+3) + (4+5+6) + (7+8+9) = 6 + 15 + 24 = 45
    );
}

#[test]
#[ignore = "Parallel tasks not yet implemented"]
fn test_parallel_map() {
    // Map operation in parallel
    expect_i32(
        "async function double(x: number): Task<number> {
             return x * 2;
         }

         async function main(): Task<number> {
             let values = [1, 2, 3, 4, 5];
             let tasks: Task<number>[] = [];
             for (let v of values) {
                 tasks.push(double(v));
             }
             let results = await all(tasks);
             let sum = 0;
             for (let r of results) {
                 sum = sum + r;
             }
             return sum;
         }
         return await main();",
        30, // 2 + 4 + 6 + 8 + 10 = 30
    );
}

// ============================================================================
// Task Cancellation
// ============================================================================

#[test]
#[ignore = "Task cancellation not yet implemented"]
fn test_task_cancel() {
    expect_i32(
        "async function longRunning(): Task<number> {
             // Would run for a long time
             return 0;
         }

         async function main(): Task<number> {
             let task = longRunning();
             task.cancel();
             return 42;
         }
         return await main();",
        42,
    );
}

// ============================================================================
// Task with Shared State
// ============================================================================

#[test]
#[ignore = "Concurrent shared state not yet implemented"]
fn test_concurrent_counter_with_mutex() {
    expect_i32(
        "class Counter {
             value: number = 0;
             mutex: Mutex = new Mutex();

             async increment(): Task<void> {
                 await this.mutex.lock();
                 this.value = this.value + 1;
                 this.mutex.unlock();
             }
         }

         async function main(): Task<number> {
             let counter = new Counter();
             let tasks: Task<void>[] = [];
             for (let i = 0; i < 10; i = i + 1) {
                 tasks.push(counter.increment());
             }
             await all(tasks);
             return counter.value;
         }
         return await main();",
        10,
    );
}

// ============================================================================
// Structured Concurrency
// ============================================================================

#[test]
#[ignore = "Structured concurrency not yet implemented"]
fn test_scoped_tasks() {
    // All child tasks complete before scope exits
    expect_i32(
        "async function main(): Task<number> {
             let result = 0;

             // Scope ensures all spawned tasks complete
             {
                 let t1 = async (): Task<void> => { result = result + 10; };
                 let t2 = async (): Task<void> => { result = result + 20; };
                 let t3 = async (): Task<void> => { result = result + 12; };
                 await all([t1, t2, t3]);
             }

             return result;
         }
         return await main();",
        42,
    );
}

// ============================================================================
// Sleep and Timing
// ============================================================================

#[test]
#[ignore = "sleep() not yet implemented"]
fn test_sleep_basic() {
    expect_i32(
        "async function main(): Task<number> {
             await sleep(0); // sleep for 0ms (yield)
             return 42;
         }
         return await main();",
        42,
    );
}

#[test]
#[ignore = "sleep() not yet implemented"]
fn test_sleep_ordering() {
    expect_i32(
        "let order: number[] = [];

         async function task1(): Task<void> {
             await sleep(10);
             order.push(1);
         }

         async function task2(): Task<void> {
             await sleep(5);
             order.push(2);
         }

         async function main(): Task<number> {
             let t1 = task1();
             let t2 = task2();
             await all([t1, t2]);
             // task2 should complete first due to shorter sleep
             return order[0];
         }
         return await main();",
        2,
    );
}

// ============================================================================
// Error Handling in Concurrent Tasks
// ============================================================================

#[test]
#[ignore = "Concurrent error handling not yet implemented"]
fn test_all_with_failure() {
    // If one task fails, all() should propagate the error
    expect_i32(
        "async function succeed(): Task<number> {
             return 42;
         }

         async function fail(): Task<number> {
             throw 'error';
         }

         async function main(): Task<number> {
             try {
                 await all([succeed(), fail()]);
                 return 0;
             } catch (e) {
                 return 42; // Caught the error
             }
         }
         return await main();",
        42,
    );
}

// ============================================================================
// Channel Communication (if supported)
// ============================================================================

#[test]
#[ignore = "Channels not yet implemented"]
fn test_channel_send_receive() {
    expect_i32(
        "async function producer(ch: Channel<number>): Task<void> {
             ch.send(42);
         }

         async function consumer(ch: Channel<number>): Task<number> {
             return await ch.receive();
         }

         async function main(): Task<number> {
             let ch = new Channel<number>();
             let t1 = producer(ch);
             let t2 = consumer(ch);
             await t1;
             return await t2;
         }
         return await main();",
        42,
    );
}
