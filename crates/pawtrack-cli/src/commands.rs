//! Subcommands and their handlers.
//!
//! Every handler except `signup` signs in with the configured credentials,
//! loads the user's pets, and then works on one pet's records.

use std::{path::Path, sync::Arc};

use anyhow::{Context as _, bail};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use pawtrack_core::{
  Auth, CalendarDate, Gateway, Record, Scope,
  care::{
    FeedingLog, FeedingSchedule, Frequency, Medication, MedicationLog,
    MedicationPatch, NewFeedingLog, NewFeedingSchedule, NewMedication,
    NewMedicationLog, NewVetVisit, VetVisit, VetVisitPatch, VisitType,
  },
  document::{Document, DocumentType, NewDocument},
  expense::{Expense, ExpenseCategory, NewExpense},
  partition::{fed_on, partition_active, partition_upcoming},
  pet::{NewPet, NewWeightRecord, Pet, PetKind, PetPatch, SizeUnit, WeightUnit},
  summary::{DateWindow, summarize},
  user::{SignIn, SignUp},
};
use pawtrack_store::{EntityStore, Media, PetStore, SessionStore, StoreError};
use uuid::Uuid;

use crate::{print, settings::Settings};

// ─── Command line ────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Create an account and sign in to it.
  Signup(SignupArgs),
  #[command(flatten)]
  Records(RecordCommand),
}

/// Commands that run as the configured user.
#[derive(Debug, Subcommand)]
pub enum RecordCommand {
  /// List, inspect and edit pets.
  #[command(subcommand)]
  Pets(PetCommand),
  /// A pet's weight history.
  #[command(subcommand)]
  Weights(WeightCommand),
  /// Vet appointments.
  #[command(subcommand)]
  Visits(VisitCommand),
  /// Medications and the doses given.
  #[command(subcommand)]
  Meds(MedCommand),
  /// Feeding schedules and feeding logs.
  #[command(subcommand)]
  Diet(DietCommand),
  /// Money spent on a pet.
  #[command(subcommand)]
  Expenses(ExpenseCommand),
  /// Uploaded documents.
  #[command(subcommand)]
  Docs(DocCommand),
}

/// The account email and password come from the configuration or from
/// `--email` and `--password`.
#[derive(Debug, Args)]
pub struct SignupArgs {
  /// Display name.
  #[arg(long)]
  pub name: String,
}

/// A pet, by id or by name (case-insensitive).
#[derive(Debug, Args)]
pub struct PetArg {
  pub pet: String,
}

#[derive(Debug, Subcommand)]
pub enum PetCommand {
  List,
  Show(PetArg),
  Add(PetFields),
  Edit {
    #[command(flatten)]
    pet:    PetArg,
    #[command(flatten)]
    fields: PetEdit,
  },
  Remove(PetArg),
}

#[derive(Debug, Args)]
pub struct PetFields {
  pub name:        String,
  #[arg(long, default_value_t = PetKind::Dog)]
  pub kind:        PetKind,
  #[arg(long)]
  pub breed:       Option<String>,
  /// Birth date, `YYYY-MM-DD`.
  #[arg(long)]
  pub born:        Option<CalendarDate>,
  #[arg(long)]
  pub weight:      Option<f64>,
  #[arg(long, default_value_t = WeightUnit::Kg)]
  pub weight_unit: WeightUnit,
  /// Height or length.
  #[arg(long)]
  pub size:        Option<f64>,
  #[arg(long, default_value_t = SizeUnit::Cm)]
  pub size_unit:   SizeUnit,
  #[arg(long)]
  pub color:       Option<String>,
  #[arg(long)]
  pub microchip:   Option<String>,
  /// A JPEG to upload as the profile photo.
  #[arg(long, value_name = "FILE")]
  pub photo:       Option<std::path::PathBuf>,
  #[arg(long)]
  pub notes:       Option<String>,
}

#[derive(Debug, Args)]
pub struct PetEdit {
  #[arg(long)]
  pub name:        Option<String>,
  #[arg(long)]
  pub kind:        Option<PetKind>,
  #[arg(long)]
  pub breed:       Option<String>,
  #[arg(long)]
  pub born:        Option<CalendarDate>,
  #[arg(long)]
  pub weight:      Option<f64>,
  #[arg(long)]
  pub weight_unit: Option<WeightUnit>,
  #[arg(long)]
  pub size:        Option<f64>,
  #[arg(long)]
  pub size_unit:   Option<SizeUnit>,
  #[arg(long)]
  pub color:       Option<String>,
  #[arg(long)]
  pub microchip:   Option<String>,
  #[arg(long, value_name = "FILE")]
  pub photo:       Option<std::path::PathBuf>,
  #[arg(long)]
  pub notes:       Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum WeightCommand {
  List(PetArg),
  Add {
    #[command(flatten)]
    pet:    PetArg,
    weight: f64,
    #[arg(long, default_value_t = WeightUnit::Kg)]
    unit:   WeightUnit,
    /// When it was measured (RFC 3339). Defaults to now.
    #[arg(long)]
    at:     Option<DateTime<Utc>>,
    #[arg(long)]
    notes:  Option<String>,
  },
  Remove {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
}

#[derive(Debug, Subcommand)]
pub enum VisitCommand {
  /// Upcoming appointments, then past ones.
  List(PetArg),
  Add {
    #[command(flatten)]
    pet:              PetArg,
    #[arg(long)]
    vet:              String,
    #[arg(long = "type", default_value_t = VisitType::Checkup)]
    visit_type:       VisitType,
    /// Appointment time (RFC 3339).
    #[arg(long)]
    at:               DateTime<Utc>,
    #[arg(long)]
    address:          Option<String>,
    #[arg(long)]
    phone:            Option<String>,
    #[arg(long)]
    cost:             Option<f64>,
    #[arg(long)]
    notes:            Option<String>,
    #[arg(long)]
    no_reminder:      bool,
    #[arg(long)]
    reminder_minutes: Option<u32>,
  },
  /// Mark an appointment as done.
  Complete {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
  Remove {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
}

#[derive(Debug, Subcommand)]
pub enum MedCommand {
  /// Active medications, then stopped ones.
  List(PetArg),
  Add {
    #[command(flatten)]
    pet:       PetArg,
    name:      String,
    dosage:    String,
    #[arg(long, default_value_t = Frequency::Daily)]
    frequency: Frequency,
    /// Defaults to today.
    #[arg(long)]
    start:     Option<CalendarDate>,
    #[arg(long)]
    end:       Option<CalendarDate>,
    /// Time of day, `HH:MM`. Repeat for several.
    #[arg(long = "time")]
    times:     Vec<String>,
    #[arg(long)]
    notes:     Option<String>,
  },
  /// Record a dose.
  Give {
    #[command(flatten)]
    pet:     PetArg,
    id:      Uuid,
    #[arg(long)]
    at:      Option<DateTime<Utc>>,
    /// Record the dose as skipped.
    #[arg(long)]
    skipped: bool,
  },
  /// Doses recorded for a medication, newest first.
  Doses {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
  Stop {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
  /// Put a stopped medication back on the active list.
  Resume {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
  Remove {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
}

#[derive(Debug, Subcommand)]
pub enum DietCommand {
  /// Feeding schedules and how many feedings were logged today.
  List(PetArg),
  Add {
    #[command(flatten)]
    pet:     PetArg,
    food:    String,
    portion: String,
    #[arg(long)]
    brand:   Option<String>,
    /// Feeding time, `HH:MM`. Repeat for several.
    #[arg(long = "time")]
    times:   Vec<String>,
    #[arg(long)]
    notes:   Option<String>,
  },
  /// Log a feeding from a schedule.
  Log {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
    #[arg(long)]
    at:  Option<DateTime<Utc>>,
  },
  Remove {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
}

#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
  List(PetArg),
  Add {
    #[command(flatten)]
    pet:         PetArg,
    amount:      f64,
    description: String,
    #[arg(long, default_value_t = ExpenseCategory::Other)]
    category:    ExpenseCategory,
    /// Defaults to today.
    #[arg(long)]
    date:        Option<CalendarDate>,
    #[arg(long)]
    notes:       Option<String>,
  },
  /// Totals for this month and all time, by category.
  Summary(PetArg),
  Remove {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
}

#[derive(Debug, Subcommand)]
pub enum DocCommand {
  List(PetArg),
  Upload {
    #[command(flatten)]
    pet:      PetArg,
    file:     std::path::PathBuf,
    /// Defaults to the file name.
    #[arg(long)]
    name:     Option<String>,
    #[arg(long = "type", default_value_t = DocumentType::Other)]
    doc_type: DocumentType,
    #[arg(long)]
    expires:  Option<CalendarDate>,
    #[arg(long)]
    notes:    Option<String>,
  },
  /// Print a temporary download link.
  Url {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
  Remove {
    #[command(flatten)]
    pet: PetArg,
    id:  Uuid,
  },
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

pub async fn run<G: Auth>(
  gateway: Arc<G>,
  settings: &Settings,
  command: Command,
) -> anyhow::Result<()> {
  let session = SessionStore::new(gateway.clone());
  let command = match command {
    Command::Signup(args) => return signup(&session, settings, args).await,
    Command::Records(command) => command,
  };

  let (email, password) = settings.credentials()?;
  let user = session.sign_in(SignIn { email, password }).await?;
  tracing::debug!(user = %user.id, "signed in");

  let app = App::new(gateway, settings).await?;
  match command {
    RecordCommand::Pets(cmd) => app.pets(cmd).await,
    RecordCommand::Weights(cmd) => app.weights(cmd).await,
    RecordCommand::Visits(cmd) => app.visits(cmd).await,
    RecordCommand::Meds(cmd) => app.meds(cmd).await,
    RecordCommand::Diet(cmd) => app.diet(cmd).await,
    RecordCommand::Expenses(cmd) => app.expenses(cmd).await,
    RecordCommand::Docs(cmd) => app.docs(cmd).await,
  }
}

async fn signup<G: Auth>(
  session: &SessionStore<G>,
  settings: &Settings,
  args: SignupArgs,
) -> anyhow::Result<()> {
  let (email, password) = settings.credentials()?;
  match session.sign_up(SignUp { name: args.name, email, password }).await? {
    Some(user) => println!("Signed up as {} <{}>", user.name, user.email),
    None => println!("Account created; confirm your email address, then sign in."),
  }
  Ok(())
}

// ─── Handlers ────────────────────────────────────────────────────────────────

struct App<G> {
  gateway: Arc<G>,
  pets:    PetStore<G>,
  media:   Media<G>,
  now:     DateTime<Utc>,
}

impl<G: Gateway> App<G> {
  async fn new(gateway: Arc<G>, settings: &Settings) -> anyhow::Result<Self> {
    let pets = PetStore::new(gateway.clone());
    pets.refresh().await;
    if let Some(err) = pets.pets().last_error() {
      bail!(err);
    }
    Ok(Self {
      media: Media::new(gateway.clone()).with_ttl(settings.signed_url_ttl_secs),
      gateway,
      pets,
      now: Utc::now(),
    })
  }

  fn today(&self) -> CalendarDate { CalendarDate::today(self.now) }

  /// Resolve a pet argument and focus it.
  async fn pet(&self, arg: &PetArg) -> anyhow::Result<Pet> {
    let pet = self
      .pets
      .pets()
      .with_records(|pets| find_pet(pets, &arg.pet).cloned())
      .with_context(|| format!("no pet matching `{}`", arg.pet))?;
    self.pets.focus(Some(pet.id)).await?;
    Ok(pet)
  }

  /// A store holding the records of type `R` owned by `parent`.
  async fn load<R: Record>(&self, parent: Uuid) -> anyhow::Result<EntityStore<G, R>> {
    let store = EntityStore::new(self.gateway.clone());
    store.load(Scope::Parent(parent)).await;
    if let Some(err) = store.last_error() {
      bail!(err);
    }
    Ok(store)
  }

  async fn read_photo(&self, path: &Path) -> anyhow::Result<String> {
    let bytes = read_file(path).await?;
    Ok(self.media.upload_pet_photo(bytes).await?)
  }

  // ── Pets ──────────────────────────────────────────────────────────────

  async fn pets(&self, cmd: PetCommand) -> anyhow::Result<()> {
    match cmd {
      PetCommand::List => {
        let pets = self.pets.pets().records();
        if pets.is_empty() {
          println!("No pets yet.");
        }
        for pet in &pets {
          println!("{}", print::pet_line(pet, self.now));
        }
      }
      PetCommand::Show(arg) => {
        let pet = self.pet(&arg).await?;
        let photo = match &pet.photo_url {
          Some(path) => Some(self.media.resolve_url(path).await?.url),
          None => None,
        };
        println!("{}", print::pet_details(&pet, self.now, photo.as_deref()));
        if let Some(latest) = self.pets.weights().records().last() {
          println!("  {:<10} {}", "last weigh", print::weight_line(latest));
        }
      }
      PetCommand::Add(fields) => {
        let photo_url = match &fields.photo {
          Some(path) => Some(self.read_photo(path).await?),
          None => None,
        };
        let draft = NewPet {
          breed: fields.breed,
          date_of_birth: fields.born,
          weight: fields.weight,
          weight_unit: fields.weight_unit,
          size: fields.size,
          size_unit: fields.size_unit,
          color: fields.color,
          microchip_id: fields.microchip,
          photo_url,
          notes: fields.notes,
          ..NewPet::new(fields.name, fields.kind)
        };
        let pet = self.pets.pets().create(draft).await?;
        println!("{}", print::pet_line(&pet, self.now));
      }
      PetCommand::Edit { pet, fields } => {
        let pet = self.pet(&pet).await?;
        let photo_url = match &fields.photo {
          Some(path) => Some(self.read_photo(path).await?),
          None => None,
        };
        let patch = PetPatch {
          name: fields.name,
          kind: fields.kind,
          breed: fields.breed,
          date_of_birth: fields.born,
          weight: fields.weight,
          weight_unit: fields.weight_unit,
          size: fields.size,
          size_unit: fields.size_unit,
          color: fields.color,
          microchip_id: fields.microchip,
          photo_url,
          notes: fields.notes,
          ..PetPatch::default()
        };
        let pet = self.pets.pets().update(pet.id, patch).await?;
        println!("{}", print::pet_line(&pet, self.now));
      }
      PetCommand::Remove(arg) => {
        let pet = self.pet(&arg).await?;
        self.pets.delete_pet(pet.id).await?;
        println!("Removed {}", pet.name);
      }
    }
    Ok(())
  }

  // ── Weights ───────────────────────────────────────────────────────────

  async fn weights(&self, cmd: WeightCommand) -> anyhow::Result<()> {
    let weights = self.pets.weights();
    match cmd {
      WeightCommand::List(arg) => {
        self.pet(&arg).await?;
        if let Some(err) = weights.last_error() {
          bail!(err);
        }
        for record in weights.records() {
          println!("{}", print::weight_line(&record));
        }
      }
      WeightCommand::Add { pet, weight, unit, at, notes } => {
        let pet = self.pet(&pet).await?;
        let record = weights
          .create(NewWeightRecord {
            pet_id: pet.id,
            weight,
            weight_unit: unit,
            recorded_at: at.unwrap_or(self.now),
            notes,
          })
          .await?;
        println!("{}", print::weight_line(&record));
      }
      WeightCommand::Remove { pet, id } => {
        self.pet(&pet).await?;
        existing(weights, id)?;
        weights.delete(id).await?;
        println!("Removed {id}");
      }
    }
    Ok(())
  }

  // ── Vet visits ────────────────────────────────────────────────────────

  async fn visits(&self, cmd: VisitCommand) -> anyhow::Result<()> {
    match cmd {
      VisitCommand::List(arg) => {
        let pet = self.pet(&arg).await?;
        let visits = self.load::<VetVisit>(pet.id).await?;
        visits.with_records(|all| {
          let split = partition_upcoming(all, self.now);
          println!("Upcoming:");
          for visit in split.upcoming {
            println!("  {}", print::visit_line(visit));
          }
          println!("Past:");
          for visit in split.past {
            println!("  {}", print::visit_line(visit));
          }
        });
      }
      VisitCommand::Add {
        pet,
        vet,
        visit_type,
        at,
        address,
        phone,
        cost,
        notes,
        no_reminder,
        reminder_minutes,
      } => {
        let pet = self.pet(&pet).await?;
        let visits = self.load::<VetVisit>(pet.id).await?;
        let mut draft = NewVetVisit::new(pet.id, vet, visit_type, at);
        draft.vet_address = address;
        draft.vet_phone = phone;
        draft.cost = cost;
        draft.notes = notes;
        draft.reminder_enabled = !no_reminder;
        if let Some(minutes) = reminder_minutes {
          draft.reminder_minutes_before = minutes;
        }
        let visit = visits.create(draft).await?;
        println!("{}", print::visit_line(&visit));
      }
      VisitCommand::Complete { pet, id } => {
        let pet = self.pet(&pet).await?;
        let visits = self.load::<VetVisit>(pet.id).await?;
        let visit = visits.update(id, VetVisitPatch::complete(self.now)).await?;
        println!("{}", print::visit_line(&visit));
      }
      VisitCommand::Remove { pet, id } => {
        let pet = self.pet(&pet).await?;
        let visits = self.load::<VetVisit>(pet.id).await?;
        existing(&visits, id)?;
        visits.delete(id).await?;
        println!("Removed {id}");
      }
    }
    Ok(())
  }

  // ── Medications ───────────────────────────────────────────────────────

  async fn meds(&self, cmd: MedCommand) -> anyhow::Result<()> {
    match cmd {
      MedCommand::List(arg) => {
        let pet = self.pet(&arg).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        meds.with_records(|all| {
          let (active, stopped) = partition_active(all);
          println!("Active:");
          for med in active {
            println!("  {}", print::medication_line(med));
          }
          println!("Stopped:");
          for med in stopped {
            println!("  {}", print::medication_line(med));
          }
        });
      }
      MedCommand::Add { pet, name, dosage, frequency, start, end, times, notes } => {
        let pet = self.pet(&pet).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        let med = meds
          .create(NewMedication {
            pet_id: pet.id,
            name,
            dosage,
            frequency,
            start_date: start.unwrap_or_else(|| self.today()),
            end_date: end,
            time_of_day: (!times.is_empty()).then_some(times),
            notes,
            reminder_enabled: true,
            active: true,
          })
          .await?;
        println!("{}", print::medication_line(&med));
      }
      MedCommand::Give { pet, id, at, skipped } => {
        let pet = self.pet(&pet).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        existing(&meds, id)?;
        let doses = self.load::<MedicationLog>(id).await?;
        let mut draft = NewMedicationLog::dose(id, at.unwrap_or(self.now));
        draft.skipped = skipped;
        let log = doses.create(draft).await?;
        println!("{}", print::dose_line(&log));
      }
      MedCommand::Doses { pet, id } => {
        let pet = self.pet(&pet).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        existing(&meds, id)?;
        let doses = self.load::<MedicationLog>(id).await?;
        for log in doses.records() {
          println!("{}", print::dose_line(&log));
        }
      }
      MedCommand::Stop { pet, id } => {
        let pet = self.pet(&pet).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        let med = meds.update(id, MedicationPatch::set_active(false)).await?;
        println!("{}", print::medication_line(&med));
      }
      MedCommand::Resume { pet, id } => {
        let pet = self.pet(&pet).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        let med = meds.update(id, MedicationPatch::set_active(true)).await?;
        println!("{}", print::medication_line(&med));
      }
      MedCommand::Remove { pet, id } => {
        let pet = self.pet(&pet).await?;
        let meds = self.load::<Medication>(pet.id).await?;
        existing(&meds, id)?;
        meds.delete(id).await?;
        println!("Removed {id}");
      }
    }
    Ok(())
  }

  // ── Diet ──────────────────────────────────────────────────────────────

  async fn diet(&self, cmd: DietCommand) -> anyhow::Result<()> {
    match cmd {
      DietCommand::List(arg) => {
        let pet = self.pet(&arg).await?;
        let schedules = self.load::<FeedingSchedule>(pet.id).await?;
        let logs = self.load::<FeedingLog>(pet.id).await?;
        for schedule in schedules.records() {
          println!("{}", print::schedule_line(&schedule));
        }
        let fed = logs.with_records(|all| fed_on(all, self.today()));
        println!("Fed {fed} time(s) today");
      }
      DietCommand::Add { pet, food, portion, brand, times, notes } => {
        let pet = self.pet(&pet).await?;
        let schedules = self.load::<FeedingSchedule>(pet.id).await?;
        let schedule = schedules
          .create(NewFeedingSchedule {
            pet_id: pet.id,
            food_name: food,
            food_brand: brand,
            portion_size: portion,
            feeding_times: times,
            notes,
          })
          .await?;
        println!("{}", print::schedule_line(&schedule));
      }
      DietCommand::Log { pet, id, at } => {
        let pet = self.pet(&pet).await?;
        let schedules = self.load::<FeedingSchedule>(pet.id).await?;
        let schedule = existing(&schedules, id)?;
        let logs = self.load::<FeedingLog>(pet.id).await?;
        let log = logs
          .create(NewFeedingLog::from_schedule(&schedule, at.unwrap_or(self.now)))
          .await?;
        println!("Fed {} ({}) at {}", log.food_name, log.portion_size, log.fed_at);
      }
      DietCommand::Remove { pet, id } => {
        let pet = self.pet(&pet).await?;
        let schedules = self.load::<FeedingSchedule>(pet.id).await?;
        existing(&schedules, id)?;
        schedules.delete(id).await?;
        println!("Removed {id}");
      }
    }
    Ok(())
  }

  // ── Expenses ──────────────────────────────────────────────────────────

  async fn expenses(&self, cmd: ExpenseCommand) -> anyhow::Result<()> {
    match cmd {
      ExpenseCommand::List(arg) => {
        let pet = self.pet(&arg).await?;
        let expenses = self.load::<Expense>(pet.id).await?;
        for expense in expenses.records() {
          println!("{}", print::expense_line(&expense));
        }
      }
      ExpenseCommand::Add { pet, amount, description, category, date, notes } => {
        let pet = self.pet(&pet).await?;
        let expenses = self.load::<Expense>(pet.id).await?;
        let mut draft = NewExpense::new(
          pet.id,
          category,
          amount,
          description,
          date.unwrap_or_else(|| self.today()),
        );
        draft.notes = notes;
        let expense = expenses.create(draft).await?;
        println!("{}", print::expense_line(&expense));
      }
      ExpenseCommand::Summary(arg) => {
        let pet = self.pet(&arg).await?;
        let expenses = self.load::<Expense>(pet.id).await?;
        let today = self.today();
        let summary =
          expenses.with_records(|all| summarize(all, DateWindow::month_of(today)));
        println!("{}", print::summary(&summary, today));
      }
      ExpenseCommand::Remove { pet, id } => {
        let pet = self.pet(&pet).await?;
        let expenses = self.load::<Expense>(pet.id).await?;
        existing(&expenses, id)?;
        expenses.delete(id).await?;
        println!("Removed {id}");
      }
    }
    Ok(())
  }

  // ── Documents ─────────────────────────────────────────────────────────

  async fn docs(&self, cmd: DocCommand) -> anyhow::Result<()> {
    match cmd {
      DocCommand::List(arg) => {
        let pet = self.pet(&arg).await?;
        let docs = self.load::<Document>(pet.id).await?;
        for doc in docs.records() {
          println!("{}", print::document_line(&doc, self.today()));
        }
      }
      DocCommand::Upload { pet, file, name, doc_type, expires, notes } => {
        let pet = self.pet(&pet).await?;
        let docs = self.load::<Document>(pet.id).await?;
        let file_name = file
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .with_context(|| format!("`{}` is not a file", file.display()))?;
        let bytes = read_file(&file).await?;
        let draft = NewDocument {
          pet_id: pet.id,
          name: name.unwrap_or_default(),
          doc_type,
          file_url: String::new(),
          file_type: String::new(),
          file_size: 0,
          notes,
          expiry_date: expires,
        };
        let content_type = guess_content_type(&file).map(str::to_owned);
        let doc = self
          .media
          .attach_document(&docs, draft, &file_name, bytes, content_type)
          .await?;
        println!("{}", print::document_line(&doc, self.today()));
      }
      DocCommand::Url { pet, id } => {
        let pet = self.pet(&pet).await?;
        let docs = self.load::<Document>(pet.id).await?;
        let doc = existing(&docs, id)?;
        let signed = self.media.resolve_url(&doc.file_url).await?;
        println!("{}", signed.url);
        if let Some(at) = signed.expires_at {
          println!("valid until {at}");
        }
      }
      DocCommand::Remove { pet, id } => {
        let pet = self.pet(&pet).await?;
        let docs = self.load::<Document>(pet.id).await?;
        existing(&docs, id)?;
        docs.delete(id).await?;
        println!("Removed {id}");
      }
    }
    Ok(())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Match by id first, then by name ignoring case.
pub fn find_pet<'a>(pets: &'a [Pet], key: &str) -> Option<&'a Pet> {
  let key = key.trim();
  if let Ok(id) = key.parse::<Uuid>()
    && let Some(pet) = pets.iter().find(|p| p.id == id)
  {
    return Some(pet);
  }
  pets.iter().find(|p| p.name.eq_ignore_ascii_case(key))
}

fn existing<G: Gateway, R: Record>(
  store: &EntityStore<G, R>,
  id: Uuid,
) -> Result<R, StoreError> {
  store.get(id).ok_or(StoreError::NotFound { id })
}

async fn read_file(path: &Path) -> anyhow::Result<Bytes> {
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read `{}`", path.display()))?;
  Ok(Bytes::from(bytes))
}

/// Content type from a file extension, for the common document formats.
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  Some(match ext.as_str() {
    "pdf" => "application/pdf",
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "heic" => "image/heic",
    "txt" => "text/plain",
    "doc" => "application/msword",
    "docx" => {
      "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }
    _ => return None,
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn pet(name: &str) -> Pet {
    Pet {
      id:            Uuid::new_v4(),
      user_id:       Uuid::nil(),
      name:          name.into(),
      kind:          PetKind::Cat,
      breed:         None,
      date_of_birth: None,
      weight:        None,
      weight_unit:   WeightUnit::Kg,
      size:          None,
      size_unit:     Default::default(),
      color:         None,
      microchip_id:  None,
      photo_url:     None,
      notes:         None,
      created_at:    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
      updated_at:    None,
    }
  }

  #[test]
  fn pets_are_found_by_id_or_name() {
    let pets = vec![pet("Mochi"), pet("Rex")];
    assert_eq!(find_pet(&pets, "rex").map(|p| p.id), Some(pets[1].id));
    assert_eq!(
      find_pet(&pets, &pets[0].id.to_string()).map(|p| p.id),
      Some(pets[0].id)
    );
    assert!(find_pet(&pets, "Biscuit").is_none());
  }

  #[test]
  fn content_type_follows_extension() {
    assert_eq!(guess_content_type(Path::new("a/Rabies.PDF")), Some("application/pdf"));
    assert_eq!(guess_content_type(Path::new("x.jpeg")), Some("image/jpeg"));
    assert_eq!(guess_content_type(Path::new("notes")), None);
    assert_eq!(guess_content_type(Path::new("archive.zip")), None);
  }
}
