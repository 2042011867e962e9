use std::process;

use na_print::{eprintln, print, println};
use numtoa::NumToA;
use slotvec::{wrappers::shared::Shared, Allocator, ArrayError, DynArray};

const REGION_SIZE: usize = 4_096;

fn main() {
    if let Err(e) = run() {
        eprintln(match e {
            ArrayError::Alloc(_) => "demo failed: out of memory",
            ArrayError::CapacityOverflow => "demo failed: capacity overflow",
            ArrayError::InvalidGrowthFactor(_) => "demo failed: bad growth factor",
        });
        process::exit(1);
    }
}

fn run() -> Result<(), ArrayError> {
    // heap backed, default growth factor
    let mut squares = DynArray::new();
    for i in 0..20usize {
        squares.push(i * i)?;
    }
    report("heap", &squares);
    while squares.len() > 3 {
        squares.remove(0);
    }
    report("heap after removals", &squares);

    // two arrays drawing from one stack region
    let mut memory = [0u8; REGION_SIZE];
    let Some(region) = Shared::from_backing(&mut memory) else {
        eprintln("region too small");
        process::exit(1);
    };
    let mut evens = DynArray::new_in(region.clone(), 2)?;
    let mut odds = DynArray::new_in(region.clone(), 2)?;
    for i in 0..30usize {
        if i % 2 == 0 {
            evens.push(i)?;
        } else {
            odds.push(i)?;
        }
    }
    report("region evens", &evens);
    report("region odds", &odds);
    print_count("region bytes free", region.available());

    evens.clear();
    odds.clear();
    print_count("region bytes free after clear", region.available());
    Ok(())
}

fn report<A: Allocator>(label: &str, array: &DynArray<usize, A>) {
    let mut buf = [0u8; 20];
    print(label);
    print(": len ");
    print(array.len().numtoa_str(10, &mut buf));
    print(", capacity ");
    print(array.capacity().numtoa_str(10, &mut buf));
    print(", [");
    for i in 0..array.len() {
        if i != 0 {
            print(" ");
        }
        if let Some(value) = array.get(i) {
            print((*value).numtoa_str(10, &mut buf));
        }
    }
    println("]");
}

fn print_count(label: &str, count: usize) {
    let mut buf = [0u8; 20];
    print(label);
    print(": ");
    println(count.numtoa_str(10, &mut buf));
}

