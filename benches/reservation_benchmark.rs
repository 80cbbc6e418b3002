use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::sync::Arc;
use tokio::runtime::Runtime;

use hotel_reservation::{
    AvailabilityRequest, BookingRequest, CapacityRecord, ConsistencyMode, MemoryCache, MemoryStore,
    ReservationApi, ReservationService, ServiceConfig,
};

// Mixed booking and availability traffic against the in-memory backends
pub fn reservation_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("reservation_service");

    for mode in [ConsistencyMode::Racy, ConsistencyMode::Serialized] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", mode)),
            &mode,
            |b, &mode| {
                b.iter(|| {
                    let config = ServiceConfig {
                        consistency: mode,
                        ..ServiceConfig::default()
                    };
                    let hotel_ids = (0..20).map(|i| format!("hotel{}", i)).collect::<Vec<_>>();
                    let store = MemoryStore::with_capacities(hotel_ids.iter().map(|id| {
                        CapacityRecord {
                            hotel_id: id.clone(),
                            total_rooms: 200,
                        }
                    }));
                    let service = Arc::new(ReservationService::new(
                        Arc::new(MemoryCache::new(config.cache.clone())),
                        Arc::new(store),
                        &config,
                    ));
                    let check_ins = (1..25)
                        .map(|d| format!("2025-06-{:02}", d))
                        .collect::<Vec<_>>();

                    rt.block_on(async {
                        let mut handles = vec![];
                        for _ in 0..4 {
                            let service = Arc::clone(&service);
                            let hotel_ids = hotel_ids.clone();
                            let check_ins = check_ins.clone();

                            handles.push(tokio::spawn(async move {
                                for _ in 0..100 {
                                    let (hotel_id, check_in, nights, rooms, book) = {
                                        let mut rng = thread_rng();
                                        (
                                            hotel_ids.choose(&mut rng).unwrap().clone(),
                                            check_ins.choose(&mut rng).unwrap().clone(),
                                            rng.gen_range(1..5u32),
                                            rng.gen_range(1..4i64),
                                            rng.gen_bool(0.3),
                                        )
                                    };
                                    let day: u32 = check_in[8..].parse().unwrap();
                                    let check_out = format!("2025-06-{:02}", day + nights);

                                    if book {
                                        // 30% bookings
                                        let _ = service
                                            .make_reservation(BookingRequest {
                                                hotel_id,
                                                check_in,
                                                check_out,
                                                customer_name: "bench".to_string(),
                                                room_count: rooms,
                                            })
                                            .await;
                                    } else {
                                        // 70% availability checks over a few hotels
                                        let _ = service
                                            .check_availability(AvailabilityRequest {
                                                hotel_ids: hotel_ids[..5].to_vec(),
                                                check_in,
                                                check_out,
                                                room_count: rooms,
                                            })
                                            .await;
                                    }
                                }
                            }));
                        }

                        for handle in handles {
                            handle.await.unwrap();
                        }
                    });

                    black_box(service.stats())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, reservation_benchmark);
criterion_main!(benches);
