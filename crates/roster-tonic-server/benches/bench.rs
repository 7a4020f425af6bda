use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::stream::FuturesUnordered;
use portable_atomic::{AtomicUsize, Ordering};
use roster_tonic_core::proto::{
    CreateUserRequest, ListUsersRequest, user_management_client::UserManagementClient,
};
use std::{
    net::TcpStream,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};
use tokio::runtime::Builder;
use tokio_stream::StreamExt;
use tonic::transport::{Channel, Uri};

const SERVER_ADDR: &str = "127.0.0.1:50061";
const SEED_USERS: usize = 10_000;

// Keeps emails unique across iterations so every create succeeds.
static NEXT_EMAIL: AtomicUsize = AtomicUsize::new(0);

fn grpc_bench(c: &mut Criterion) {
    let uri = Uri::try_from(format!("http://{SERVER_ADDR}")).expect("Invalid URI");
    // Start the server. This may require a full compilation so set the timeout
    // high.
    let mut server = Command::new("cargo")
        .args([
            "run",
            "--bin",
            "roster-server",
            "--release",
            "--",
            "--server-addr",
            SERVER_ADDR,
        ])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("Failed to start roster-server");
    wait_for_port(SERVER_ADDR, 300);

    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let channel = rt
        .block_on(Channel::builder(uri).connect())
        .expect("Failed to connect to server");

    rt.block_on(create_users(&channel, SEED_USERS, 16));

    for concurrency in [1, 8, 32] {
        let mut group = c.benchmark_group("grpc/create_user");
        group.throughput(Throughput::Elements(concurrency as u64));
        group.bench_function(format!("conc/{concurrency}"), |b| {
            b.to_async(&rt).iter_custom(|iters| {
                let channel = channel.clone();
                async move {
                    let start = Instant::now();
                    for _ in 0..iters {
                        create_users(&channel, concurrency, concurrency).await;
                    }
                    start.elapsed()
                }
            });
        });
        group.finish();
    }

    for page_size in [100, 1_000, 0] {
        let mut group = c.benchmark_group("grpc/list_users");
        let expected = if page_size == 0 { SEED_USERS } else { page_size };
        group.throughput(Throughput::Elements(expected as u64));
        group.bench_function(format!("page/{page_size}"), |b| {
            b.to_async(&rt).iter_custom(|iters| {
                let channel = channel.clone();
                async move {
                    let start = Instant::now();
                    for _ in 0..iters {
                        list_users(&channel, page_size as i32).await;
                    }
                    start.elapsed()
                }
            });
        });
        group.finish();
    }

    if server.kill().is_err() {
        eprintln!("failed to kill server");
    }
}

async fn create_users(channel: &Channel, total: usize, concurrency: usize) {
    let mut tasks = FuturesUnordered::new();

    for worker in 0..concurrency {
        let channel = channel.clone();
        let count = total / concurrency + usize::from(worker < total % concurrency);

        tasks.push(tokio::spawn(async move {
            let mut client = UserManagementClient::new(channel);
            for _ in 0..count {
                let n = NEXT_EMAIL.fetch_add(1, Ordering::Relaxed);
                let reply = client
                    .create_user(CreateUserRequest {
                        name: format!("Bench User {n}"),
                        email: format!("bench{n}@example.com"),
                        age: (n % 100) as i32,
                    })
                    .await
                    .expect("create call failed")
                    .into_inner();
                assert!(reply.success, "{}", reply.message);
                black_box(reply);
            }
        }));
    }

    while let Some(res) = tasks.next().await {
        res.unwrap();
    }
}

async fn list_users(channel: &Channel, page_size: i32) {
    let mut client = UserManagementClient::new(channel.clone());
    let mut stream = client
        .list_users(ListUsersRequest {
            filter: String::new(),
            page_size,
        })
        .await
        .expect("list call failed")
        .into_inner();

    while let Some(user) = stream.next().await {
        black_box(user.expect("stream item"));
    }
}

pub fn wait_for_port(addr: &str, timeout_secs: u64) {
    let start = Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("Server did not start listening on {}", addr);
}

criterion_group!(grpc_benches, grpc_bench);
criterion_main!(grpc_benches);
