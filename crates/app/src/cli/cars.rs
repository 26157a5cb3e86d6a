use clap::{Args, Subcommand};
use driveshare_app::domain::{
    cars::{
        CarsService,
        data::{CarQuery, CarSearch, NewCar},
        records::{CarRecord, CarStatus, CarUuid, Transmission},
    },
    users::records::UserUuid,
};

use crate::cli::{
    Session, failed,
    output::{fields, money, table},
};

#[derive(Debug, Args)]
pub(crate) struct CarsCommand {
    #[command(subcommand)]
    command: CarsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CarsSubcommand {
    /// Search approved listings
    Search(SearchArgs),
    /// Show one car
    Show(CarArgs),
    /// List the cars you can see
    List(ListArgs),
    /// List a car for review
    Add(AddArgs),
    /// Approve a pending listing (admin only)
    Approve(CarArgs),
    /// Reject a pending listing (admin only)
    Reject(CarArgs),
    /// Listings awaiting review (admin only)
    Pending,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Text matched against make, model and location
    #[arg(long)]
    text: Option<String>,

    /// Body style, e.g. SUV
    #[arg(long)]
    car_type: Option<String>,

    /// Gearbox type (automatic, manual)
    #[arg(long)]
    transmission: Option<Transmission>,

    /// Highest daily rate in cents
    #[arg(long)]
    max_price: Option<u64>,
}

#[derive(Debug, Args)]
struct CarArgs {
    /// Car UUID
    car: CarUuid,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only cars in this state (pending, approved, rejected)
    #[arg(long)]
    status: Option<CarStatus>,

    /// Only cars listed by this owner
    #[arg(long)]
    owner: Option<UserUuid>,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    make: String,

    #[arg(long)]
    model: String,

    #[arg(long)]
    year: i16,

    /// Gearbox type (automatic, manual)
    #[arg(long, default_value = "automatic")]
    transmission: Transmission,

    #[arg(long, default_value_t = 5)]
    seats: u8,

    #[arg(long, default_value_t = 0)]
    mileage: u32,

    #[arg(long, default_value = "")]
    description: String,

    /// Daily rate in cents
    #[arg(long)]
    base_price: u64,

    #[arg(long)]
    location: String,

    /// Body style, e.g. Sedan
    #[arg(long)]
    car_type: String,

    /// Image URL; repeat for more
    #[arg(long = "image")]
    images: Vec<String>,

    /// Registration document URL; repeat for more
    #[arg(long = "document")]
    documents: Vec<String>,
}

pub(crate) async fn run(command: CarsCommand, session: &Session) -> Result<(), String> {
    let cars = &session.app.cars;
    let actor = session.actor;

    match command.command {
        CarsSubcommand::Search(args) => {
            let found = cars
                .search_cars(CarSearch {
                    text: args.text,
                    car_type: args.car_type,
                    transmission: args.transmission,
                    max_price: args.max_price,
                })
                .await
                .map_err(failed("search cars"))?;

            print_cars(&found, false);
        }
        CarsSubcommand::Show(args) => {
            let car = cars
                .get_car(actor, args.car)
                .await
                .map_err(failed("load car"))?;

            print_car(&car);
        }
        CarsSubcommand::List(args) => {
            let listed = cars
                .list_cars(
                    actor,
                    CarQuery {
                        status: args.status,
                        owner: args.owner,
                    },
                )
                .await
                .map_err(failed("list cars"))?;

            print_cars(&listed, true);
        }
        CarsSubcommand::Add(args) => {
            let car = cars
                .add_car(
                    actor,
                    NewCar {
                        uuid: CarUuid::new(),
                        make: args.make,
                        model: args.model,
                        year: args.year,
                        transmission: args.transmission,
                        seats: args.seats,
                        mileage: args.mileage,
                        description: args.description,
                        base_price: args.base_price,
                        images: args.images,
                        documents: args.documents,
                        location: args.location,
                        car_type: args.car_type,
                        status: None,
                    },
                )
                .await
                .map_err(failed("add car"))?;

            println!("car_uuid: {}", car.uuid);
            println!("status: {}", car.status);
        }
        CarsSubcommand::Approve(args) => review(session, args.car, CarStatus::Approved).await?,
        CarsSubcommand::Reject(args) => review(session, args.car, CarStatus::Rejected).await?,
        CarsSubcommand::Pending => {
            let pending = cars
                .pending_cars(actor)
                .await
                .map_err(failed("list pending cars"))?;

            print_cars(&pending, true);
        }
    }

    Ok(())
}

async fn review(session: &Session, car: CarUuid, status: CarStatus) -> Result<(), String> {
    let car = session
        .app
        .cars
        .set_car_status(session.actor, car, status)
        .await
        .map_err(failed("review car"))?;

    println!("{} {} {} is now {}", car.year, car.make, car.model, car.status);

    Ok(())
}

fn print_cars(cars: &[CarRecord], with_status: bool) {
    if cars.is_empty() {
        println!("no cars found");
        return;
    }

    let rows = cars.iter().map(|car| {
        [
            car.uuid.to_string(),
            format!("{} {} {}", car.year, car.make, car.model),
            car.car_type.clone(),
            car.transmission.to_string(),
            car.location.clone(),
            if with_status {
                car.status.to_string()
            } else {
                car.seats.to_string()
            },
            money(car.base_price),
        ]
    });

    let sixth = if with_status { "Status" } else { "Seats" };

    println!(
        "{}",
        table(
            ["Car", "Vehicle", "Type", "Gearbox", "Location", sixth, "Per day"],
            rows,
            6..7,
        )
    );
}

fn print_car(car: &CarRecord) {
    fields([
        ("car_uuid", car.uuid.to_string()),
        ("owner_uuid", car.owner_uuid.to_string()),
        ("vehicle", format!("{} {} {}", car.year, car.make, car.model)),
        ("type", car.car_type.clone()),
        ("transmission", car.transmission.to_string()),
        ("seats", car.seats.to_string()),
        ("mileage", car.mileage.to_string()),
        ("location", car.location.clone()),
        ("per_day", money(car.base_price)),
        ("status", car.status.to_string()),
        ("description", car.description.clone()),
        ("images", car.images.join(", ")),
    ]);
}
